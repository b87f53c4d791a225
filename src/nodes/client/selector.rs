//! Replica targeting and failover.

use crate::config::InitialTarget;
use eyre::ensure;
use rand::Rng;
use std::net::SocketAddr;

/// The ordered, immutable list of replica addresses a session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSet {
    addrs: Vec<SocketAddr>,
}

impl ReplicaSet {
    /// Creates a replica set from the given addresses.
    ///
    /// An empty list is a configuration error, not a runtime condition, so it fails fast.
    pub fn new(addrs: Vec<SocketAddr>) -> eyre::Result<Self> {
        ensure!(!addrs.is_empty(), "replica set must not be empty");
        Ok(Self { addrs })
    }

    /// Number of replicas.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Always `false`; the constructor rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// The address at the given index.
    pub fn addr(&self, index: usize) -> SocketAddr {
        self.addrs[index]
    }

    /// Iterates over all replica addresses in order.
    pub fn iter(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.addrs.iter().copied()
    }
}

/// Cursor into a [`ReplicaSet`] implementing the failover policy.
///
/// The selector is always in a state `Targeting(i)`; on an application-level failure it moves
/// to `Targeting((i + 1) % len)`, cycling over the replicas indefinitely. There is no terminal
/// state. Each session owns its selector exclusively: the transition is a read-modify-write on
/// the index and must never be shared across tasks without external locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    current: usize,
    len: usize,
}

impl Selector {
    /// Creates a selector over `replicas`, starting at index 0 or at a random index.
    pub fn new(replicas: &ReplicaSet, initial_target: InitialTarget) -> Self {
        let current = match initial_target {
            InitialTarget::First => 0,
            InitialTarget::Random => rand::thread_rng().gen_range(0..replicas.len()),
        };
        Self {
            current,
            len: replicas.len(),
        }
    }

    /// The index of the currently targeted replica.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Advances to the next replica (wrapping) and returns the new target index.
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.len;
        self.current
    }

    /// Re-targets a uniformly random replica.
    ///
    /// Load drivers use this between rounds to spread sessions over the cluster.
    pub fn retarget_random(&mut self) {
        self.current = rand::thread_rng().gen_range(0..self.len);
    }
}
