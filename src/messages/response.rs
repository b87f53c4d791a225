//! Provides the main [`Response`] enum and the per-call reply types.

use hydris_api::lattice::causal::VectorClock;

/// A replica's reply to a [`Request`][super::Request].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Response {
    /// Reply to one of the put variants.
    Put(PutResponse),
    /// Reply to one of the get variants.
    Get(GetResponse),
}

/// Reply to a [`PutRequest`][super::PutRequest].
///
/// `success == false` or an absent clock both mean the replica declined the write (e.g. it is
/// not the writable primary for this causal queue); clients treat the two identically as an
/// application-level failure.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PutResponse {
    /// Whether the replica applied the write.
    pub success: bool,
    /// The replica's clock after applying the write, absent on failure.
    pub vector_clock: Option<VectorClock>,
}

/// Reply to a [`GetRequest`][super::GetRequest].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GetResponse {
    /// Whether the replica served the read.
    pub success: bool,
    /// The value stored for the requested key, empty on failure.
    pub value: String,
    /// The clock under which the replica served the read, absent on failure.
    pub vector_clock: Option<VectorClock>,
}

impl GetResponse {
    /// The reply's clock, reading an absent clock as the all-zero clock.
    ///
    /// Used when ranking quorum replies, where declined replies must never dominate.
    pub fn vector_clock_or_zero(&self) -> VectorClock {
        self.vector_clock.clone().unwrap_or_default()
    }
}
