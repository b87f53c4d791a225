#![warn(missing_docs)]

//! Client-side protocol engine of the `hydris` replicated key-value store.
//!
//! `hydris` replicas offer tunable consistency: a causal mode and a *writeless-causal* mode,
//! a server-side write-coalescing optimization for write-heavy workloads whose client-visible
//! protocol is unchanged. This crate implements everything that runs on the client:
//!
//! - the [`VectorClock`][lattice::causal::VectorClock] partial order used to detect causal
//!   dominance between replica states (re-exported from `hydris-api`),
//! - the lattice merge abstraction that resolves conflicting states deterministically, and
//! - the [`CausalClient`] request protocol: single-replica causal reads and writes,
//!   quorum-style reads that poll every replica and keep the causally latest reply, and the
//!   round-robin failover that retries against the next replica when the current one declines.
//!
//! Replica servers are external collaborators: they are identified only by their network
//! address and answer the four RPCs defined in [`messages`].
//!
//! ## Usage example
//!
//! ```no_run
//! use hydris::{config::ClientConfig, nodes::client::CausalClient};
//!
//! # async fn example() -> eyre::Result<()> {
//! let mut client = CausalClient::new(ClientConfig::new(vec![
//!     "127.0.0.1:12340".parse().unwrap(),
//!     "127.0.0.1:12341".parse().unwrap(),
//! ]))?;
//!
//! if client.put("key".into(), "value".into()).await {
//!     let (value, found) = client.get("key".into()).await;
//!     assert!(found);
//!     println!("{}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub use hydris_api::{lattice, ClientKey};

pub use nodes::client::CausalClient;

pub mod config;
pub mod messages;
pub mod metrics;
pub mod nodes;
