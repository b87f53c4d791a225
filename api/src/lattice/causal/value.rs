use super::VectorClock;
use crate::lattice::Lattice;

/// A lattice that pairs an opaque payload with the [`VectorClock`] under which it was written.
///
/// Merging resolves conflicting replica states by causal dominance alone: the payload and
/// clock of `other` are adopted if and only if `other`'s clock strictly
/// [dominates][VectorClock::dominates] the local one. In every other case (dominant, equal, or
/// concurrent local clock) the locally held state is kept. Wall-clock time is deliberately not
/// consulted, so this is not last-writer-wins.
///
/// The merge never fails, is idempotent (`merge(X, X)` leaves `X` unchanged), and converges:
/// merging A into B and B into A both end with the dominant state. For mutually concurrent
/// states the tie-break is "local state wins", which is deterministic for a fixed merge
/// direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValueLattice<T> {
    payload: ClockedValue<T>,
}

impl<T> ValueLattice<T> {
    /// Creates a lattice holding the given payload written under the given clock.
    pub fn new(value: T, vector_clock: VectorClock) -> Self {
        Self {
            payload: ClockedValue {
                value,
                vector_clock,
            },
        }
    }

    /// The clock under which the current payload was written.
    pub fn vector_clock(&self) -> &VectorClock {
        &self.payload.vector_clock
    }
}

impl<T> Lattice for ValueLattice<T>
where
    T: Clone,
{
    type Element = ClockedValue<T>;

    fn reveal(&self) -> &ClockedValue<T> {
        &self.payload
    }

    fn into_revealed(self) -> ClockedValue<T> {
        self.payload
    }

    fn assign(&mut self, element: Self::Element) {
        self.payload = element;
    }

    fn merge_element(&mut self, other: &ClockedValue<T>) {
        if other.vector_clock.dominates(&self.payload.vector_clock) {
            // other causally follows our state, adopt it wholesale
            self.payload = other.clone();
        }
        // dominated, equal, or concurrent: keep the local state
    }
}

/// Pair of a payload and the [`VectorClock`] it was written under.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[allow(missing_docs)]
pub struct ClockedValue<T> {
    pub value: T,
    pub vector_clock: VectorClock,
}
