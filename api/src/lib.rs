#![warn(missing_docs)]

//! Shared data model of the `hydris` key-value store.
//!
//! This crate contains the types that both clients and replica servers agree on: the
//! [`Lattice`][lattice::Lattice] abstraction used for deterministic conflict resolution and the
//! [`VectorClock`][lattice::causal::VectorClock] used to track causal progress across replicas.

use std::sync::Arc;

pub mod lattice;

/// A string-based key type used to store user-supplied data.
///
/// We use an [`Arc`]-wrapped [`String`] because keys often get cloned. For bare strings, this
/// would require a reallocation, but with the `Arc` wrapper only a reference counter is
/// incremented.
#[derive(Debug, PartialEq, Eq, Hash, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClientKey(Arc<String>);

impl std::ops::Deref for ClientKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Arc<String>> for ClientKey {
    fn from(k: Arc<String>) -> Self {
        Self(k)
    }
}

impl From<String> for ClientKey {
    fn from(k: String) -> Self {
        Self::from(Arc::new(k))
    }
}

impl From<&str> for ClientKey {
    fn from(k: &str) -> Self {
        Self::from(k.to_owned())
    }
}
