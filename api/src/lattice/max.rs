use super::Lattice;

/// [`Lattice`] implementation that merges elements by taking their maximum.
///
/// ## Example
///
/// ```
/// use hydris_api::lattice::{Lattice, MaxLattice};
///
/// let mut lattice = MaxLattice::new(4u64);
/// assert_eq!(lattice.reveal(), &4);
///
/// lattice.merge_element(&6);
/// assert_eq!(lattice.reveal(), &6);
///
/// lattice.merge_element(&5);
/// assert_eq!(lattice.reveal(), &6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MaxLattice<T> {
    element: T,
}

impl<T: Ord> MaxLattice<T> {
    /// Constructs a new lattice from the given value.
    pub fn new(element: T) -> Self {
        Self { element }
    }
}

impl<T: Ord + Clone> Lattice for MaxLattice<T> {
    type Element = T;

    fn reveal(&self) -> &T {
        &self.element
    }

    fn into_revealed(self) -> T {
        self.element
    }

    fn assign(&mut self, element: Self::Element) {
        self.element = element;
    }

    fn merge_element(&mut self, element: &T) {
        if &self.element < element {
            self.element = element.clone();
        }
    }
}
