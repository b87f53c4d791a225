//! Contains the [`Lattice`] trait and its implementations.
//!
//! The following base lattices are available:
//!
//! - **[`MaxLattice`]:** Defines the merge operation as the maximum of the two values.
//! - **[`MapLattice`]:** A hash map that stores lattice types. When merging two maps,
//!     conflicting values are resolved by applying their merge operator.
//!
//! On top of these, the [`causal`] submodule builds the vector-clock based lattices that the
//! `hydris` client protocol relies on: [`causal::VectorClock`], [`causal::ValueLattice`], and
//! [`causal::HybridLattice`].

pub use self::{map::MapLattice, max::MaxLattice};

pub mod causal;

mod map;
mod max;

/// Abstraction for a [_bounded join semilattice_](https://en.wikipedia.org/wiki/Semilattice),
/// the foundation of coordination-free replication in `hydris`.
///
/// A join semilattice is a set that has a unique supremum (least upper bound) operator `⊔`
/// for all pairs of values. The `⊔` operator must be
/// [commutative](https://en.wikipedia.org/wiki/Commutative),
/// [associative](https://en.wikipedia.org/wiki/Associative_property), and
/// [idempotent](https://en.wikipedia.org/wiki/Idempotence).
///
/// The lattice properties are useful for a key value store since the supremum of a set of
/// values does not depend on the order they are merged together. Replicas can apply key
/// updates in different orders and still converge to the same end value without any
/// synchronization.
///
/// Since the consistency of the key value store depends on the guarantees of this trait, **all
/// implementations must fulfill the join semilattice properties**. Instead of implementing
/// this trait for new types, it is often possible to compose the existing implementations
/// into more complex types.
pub trait Lattice {
    /// The type that is stored in this lattice.
    type Element;

    /// Returns the current value stored in the lattice.
    fn reveal(&self) -> &Self::Element;

    /// Returns the current value stored in the lattice, taking ownership.
    fn into_revealed(self) -> Self::Element;

    /// Assigns a new value to the lattice without any merging.
    fn assign(&mut self, element: Self::Element);

    /// Updates the lattice value with the supremum of the current and given values.
    ///
    /// This implements the supremum operator `⊔` described above.
    fn merge_element(&mut self, element: &Self::Element);

    /// Updates the lattice value with the supremum of the current and given values.
    ///
    /// This is a convenience method that reveals the value of `other` and then calls the
    /// [`merge_element`][Self::merge_element] method.
    fn merge(&mut self, other: &Self) {
        self.merge_element(other.reveal());
    }
}
