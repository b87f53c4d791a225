use super::{value::ClockedValue, ValueLattice, VectorClock};
use crate::{lattice::Lattice, ClientKey};

/// A [`ValueLattice`] scoped to a single key of the store.
///
/// Replicas exchange per-key states, so the merge is only defined between lattices carrying
/// the same key. Merging lattices for different keys is a caller error, not a runtime
/// condition: [`merge_element`][Lattice::merge_element] panics in that case.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HybridLattice<T> {
    key: ClientKey,
    value: ValueLattice<T>,
}

impl<T> HybridLattice<T> {
    /// Creates a lattice for the given key, holding the given payload and clock.
    pub fn new(key: ClientKey, value: T, vector_clock: VectorClock) -> Self {
        Self {
            key,
            value: ValueLattice::new(value, vector_clock),
        }
    }

    /// The key this state belongs to.
    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    /// The clock under which the current payload was written.
    pub fn vector_clock(&self) -> &VectorClock {
        self.value.vector_clock()
    }
}

impl<T> Lattice for HybridLattice<T>
where
    T: Clone,
{
    type Element = ClockedValue<T>;

    fn reveal(&self) -> &ClockedValue<T> {
        self.value.reveal()
    }

    fn into_revealed(self) -> ClockedValue<T> {
        self.value.into_revealed()
    }

    fn assign(&mut self, element: Self::Element) {
        self.value.assign(element);
    }

    fn merge_element(&mut self, other: &ClockedValue<T>) {
        self.value.merge_element(other);
    }

    /// Merges the state of `other` into `self`.
    ///
    /// # Panics
    ///
    /// Panics if the two lattices belong to different keys.
    fn merge(&mut self, other: &Self) {
        assert_eq!(
            self.key, other.key,
            "attempted to merge hybrid lattices for different keys"
        );
        self.value.merge(&other.value);
    }
}
