use super::Lattice;
use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// [`HashMap`]-based lattice that stores other lattice types as values.
///
/// The merge operation takes the union of the key set of both maps. For keys that are present
/// in both maps, the two values are merged using their merge function.
///
/// ## Example
///
/// ```
/// use hydris_api::lattice::{Lattice, MapLattice, MaxLattice};
/// use std::collections::HashMap;
///
/// let mut map = HashMap::new();
/// map.insert("foo", MaxLattice::new(5u64));
/// map.insert("bar", MaxLattice::new(12));
///
/// let mut lattice = MapLattice::new(map);
///
/// let mut other = HashMap::new();
/// other.insert("bar", MaxLattice::new(3));
/// other.insert("baz", MaxLattice::new(42));
/// lattice.merge_element(&other);
///
/// // `baz` is new, `bar` is resolved through the value's merge operation
/// assert_eq!(lattice.reveal().get("baz"), Some(&MaxLattice::new(42)));
/// assert_eq!(lattice.reveal().get("bar"), Some(&MaxLattice::new(12)));
/// ```
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MapLattice<K, V> {
    #[serde(bound = "
        K: Hash + Eq + serde::Serialize + for<'a> serde::Deserialize<'a>,
        V: serde::Serialize + for<'a> serde::Deserialize<'a>,
    ")]
    element: HashMap<K, V>,
}

impl<K, V> Lattice for MapLattice<K, V>
where
    K: Eq + Hash + Clone,
    V: Lattice + Clone,
{
    type Element = HashMap<K, V>;

    fn reveal(&self) -> &HashMap<K, V> {
        &self.element
    }

    fn into_revealed(self) -> HashMap<K, V> {
        self.element
    }

    fn assign(&mut self, element: Self::Element) {
        self.element = element;
    }

    fn merge_element(&mut self, elements: &HashMap<K, V>) {
        for (key, value) in elements {
            match self.element.entry(key.clone()) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(value.clone());
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    entry.get_mut().merge(value);
                }
            };
        }
    }
}

impl<K, V> MapLattice<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new lattice from the given map.
    pub fn new(element: HashMap<K, V>) -> Self {
        Self { element }
    }

    /// Inserts the given value into the map, merging it with the previous value if any.
    pub fn insert(&mut self, key: K, value: V)
    where
        V: Lattice,
    {
        match self.element.entry(key) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                entry.get_mut().merge(&value);
            }
        };
    }

    /// Returns a reference to the value stored for the given key, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.element.get(key)
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.element.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.element.is_empty()
    }
}

impl<K, V> Default for MapLattice<K, V> {
    fn default() -> Self {
        Self {
            element: Default::default(),
        }
    }
}

impl<K, V> PartialEq for MapLattice<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

impl<K, V> Eq for MapLattice<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
}
