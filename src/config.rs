//! Configuration types for constructing client sessions.
//!
//! The top level config type is [`ClientConfig`].

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

/// The consistency level a session operates under.
///
/// The writeless-causal mode lets replicas coalesce repeated writes to the same key. This is
/// purely a server-side optimization: the client control flow is identical, only the wire
/// calls differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsistencyLevel {
    /// Causal consistency over a single replica per operation.
    #[default]
    Causal,
    /// Causal consistency with server-side write coalescing.
    WritelessCausal,
}

/// Controls which replica a fresh session targets first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialTarget {
    /// Start at index 0 of the replica list.
    #[default]
    First,
    /// Start at a uniformly random index.
    Random,
}

/// Configuration for a [`CausalClient`][crate::nodes::client::CausalClient] session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The ordered list of replica addresses. Must be non-empty.
    pub replicas: Vec<SocketAddr>,
    /// The consistency level to operate under.
    pub consistency_level: ConsistencyLevel,
    /// Whether [`get`][crate::nodes::client::CausalClient::get] polls every replica and keeps
    /// the causally latest reply instead of reading from the current target only.
    pub quorum_reads: bool,
    /// Bound on each individual RPC attempt (connect + send + receive).
    pub timeout: Duration,
    /// Optional bound on a whole operation including its failover retries.
    ///
    /// The default is `None`: operations retry forever, preferring a possibly stale causal
    /// read over an error. With a deadline set, an operation whose retries exceed it reports
    /// failure to the caller.
    pub deadline: Option<Duration>,
    /// Which replica a fresh session targets first.
    pub initial_target: InitialTarget,
}

impl ClientConfig {
    /// Creates a config for the given replica list with the default protocol settings:
    /// causal consistency, single-replica reads, a 5 second per-attempt timeout, and no
    /// retry deadline.
    pub fn new(replicas: Vec<SocketAddr>) -> Self {
        Self {
            replicas,
            consistency_level: ConsistencyLevel::default(),
            quorum_reads: false,
            timeout: Duration::from_secs(5),
            deadline: None,
            initial_target: InitialTarget::default(),
        }
    }
}
