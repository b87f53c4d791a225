//! Vector clocks and the causally consistent lattices built on them.
//!
//! The [`VectorClock`] tracks one logical counter per replica and yields a *partial* order:
//! two clocks may be [`Concurrent`][ClockOrdering::Concurrent], in which case neither state
//! causally follows the other. The [`ValueLattice`] and [`HybridLattice`] use this ordering to
//! resolve conflicting replica states deterministically, always keeping the causally dominant
//! one.

pub use self::{
    hybrid::HybridLattice,
    value::{ClockedValue, ValueLattice},
};

use super::{Lattice, MapLattice, MaxLattice};
use std::collections::HashMap;

mod hybrid;
mod value;

/// The result of comparing two [`VectorClock`]s.
///
/// Vector clocks only form a partial order, so in addition to the three outcomes of a total
/// order there is a fourth: [`Concurrent`][Self::Concurrent], for clocks that each advanced in
/// a dimension the other has not observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockOrdering {
    /// `self` strictly dominates the other clock: every component is `>=` and at least one
    /// is `>`.
    Dominates,
    /// The other clock strictly dominates `self`.
    Dominated,
    /// Both clocks are componentwise identical.
    Equal,
    /// Neither clock dominates the other.
    Concurrent,
}

/// A [vector clock](https://en.wikipedia.org/wiki/Vector_clock) mapping replica identifiers to
/// monotonically increasing counters.
///
/// Internally this is a [`MapLattice`] with [`MaxLattice`] values, so merging two clocks takes
/// the componentwise maximum. Replicas that are absent from the map are treated as having the
/// counter `0` ("never observed"), which makes comparisons total over clocks with disjoint key
/// sets, e.g. when a replica freshly joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    entries: MapLattice<String, MaxLattice<u64>>,
}

impl VectorClock {
    /// Creates an empty clock (all counters implicitly `0`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock with one zero-valued entry per given replica id.
    ///
    /// Semantically equivalent to an empty clock, but mirrors the wire representation that
    /// replicas exchange, where every known peer is listed explicitly.
    pub fn seeded(replica_ids: impl IntoIterator<Item = String>) -> Self {
        let mut entries = MapLattice::default();
        for id in replica_ids {
            entries.insert(id, MaxLattice::new(0));
        }
        Self { entries }
    }

    /// Creates a clock from a raw counter map.
    pub fn from_map(counters: HashMap<String, u64>) -> Self {
        Self {
            entries: MapLattice::new(
                counters
                    .into_iter()
                    .map(|(id, n)| (id, MaxLattice::new(n)))
                    .collect(),
            ),
        }
    }

    /// Returns the counter for the given replica, `0` if the replica was never observed.
    pub fn get(&self, replica_id: &str) -> u64 {
        self.entries
            .get(replica_id)
            .map(|counter| *counter.reveal())
            .unwrap_or(0)
    }

    /// Classifies the relation between `self` and `other`.
    ///
    /// The comparison runs over the union of both key sets, reading missing entries as `0`.
    /// Pure and total: any two clocks compare to exactly one [`ClockOrdering`]. Note that two
    /// clocks whose explicit entries are disjoint but all zero compare as
    /// [`Equal`][ClockOrdering::Equal], since every component of the union is `0` on both
    /// sides.
    pub fn compare(&self, other: &Self) -> ClockOrdering {
        let mut self_greater = false;
        let mut other_greater = false;

        for (id, counter) in self.entries.reveal() {
            let ours = *counter.reveal();
            let theirs = other.get(id);
            if ours > theirs {
                self_greater = true;
            } else if ours < theirs {
                other_greater = true;
            }
        }
        for (id, counter) in other.entries.reveal() {
            if self.entries.get(id).is_none() && *counter.reveal() > 0 {
                other_greater = true;
            }
        }

        match (self_greater, other_greater) {
            (true, true) => ClockOrdering::Concurrent,
            (true, false) => ClockOrdering::Dominates,
            (false, true) => ClockOrdering::Dominated,
            (false, false) => ClockOrdering::Equal,
        }
    }

    /// Returns `true` iff `self` strictly dominates `other`.
    ///
    /// This is the "is upper" relation of the causal protocol: every component of `self` is
    /// `>=` the corresponding component of `other` and the clocks are not identical. A clock
    /// never dominates itself, and dominance is antisymmetric.
    pub fn dominates(&self, other: &Self) -> bool {
        self.compare(other) == ClockOrdering::Dominates
    }
}

impl Lattice for VectorClock {
    type Element = HashMap<String, MaxLattice<u64>>;

    fn reveal(&self) -> &Self::Element {
        self.entries.reveal()
    }

    fn into_revealed(self) -> Self::Element {
        self.entries.into_revealed()
    }

    fn assign(&mut self, element: Self::Element) {
        self.entries.assign(element);
    }

    fn merge_element(&mut self, element: &Self::Element) {
        self.entries.merge_element(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(entries: &[(&str, u64)]) -> VectorClock {
        VectorClock::from_map(entries.iter().map(|(id, n)| (id.to_string(), *n)).collect())
    }

    #[test]
    fn no_self_dominance() {
        let a = clock(&[("r0", 3), ("r1", 1)]);
        assert!(!a.dominates(&a));
        assert_eq!(a.compare(&a), ClockOrdering::Equal);
    }

    #[test]
    fn antisymmetry() {
        let a = clock(&[("r0", 2), ("r1", 1)]);
        let b = clock(&[("r0", 1), ("r1", 1)]);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert_eq!(a.compare(&b), ClockOrdering::Dominates);
        assert_eq!(b.compare(&a), ClockOrdering::Dominated);
    }

    #[test]
    fn missing_keys_read_as_zero() {
        // a has advanced in a dimension b never observed
        let a = clock(&[("r0", 1)]);
        let b = VectorClock::new();
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn disjoint_clocks_are_concurrent() {
        let a = clock(&[("r0", 1)]);
        let b = clock(&[("r1", 1)]);
        assert_eq!(a.compare(&b), ClockOrdering::Concurrent);
        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn disjoint_all_zero_clocks_are_equal() {
        let a = VectorClock::seeded(["r0".to_owned()]);
        let b = VectorClock::seeded(["r1".to_owned()]);
        assert_eq!(a.compare(&b), ClockOrdering::Equal);
        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn seeded_clock_is_equivalent_to_empty() {
        let seeded = VectorClock::seeded(["r0".to_owned(), "r1".to_owned()]);
        assert_eq!(seeded.compare(&VectorClock::new()), ClockOrdering::Equal);
        assert_eq!(seeded.get("r0"), 0);
        assert_eq!(seeded.get("unknown"), 0);
    }

    #[test]
    fn merge_takes_componentwise_maximum() {
        let mut a = clock(&[("r0", 2), ("r1", 1)]);
        let b = clock(&[("r0", 1), ("r2", 4)]);
        a.merge(&b);
        assert_eq!(a, clock(&[("r0", 2), ("r1", 1), ("r2", 4)]));
    }
}
