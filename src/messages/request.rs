//! Provides the main [`Request`] enum and the per-call payload types.

use hydris_api::{lattice::causal::VectorClock, ClientKey};

/// A single client request to a replica server.
///
/// The target replica responds with a [`Response`][super::Response] of the matching
/// direction: a `Put` reply for the put variants, a `Get` reply for the get variants.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Request {
    /// Write a value under causal consistency.
    PutInCausal(PutRequest),
    /// Read a value under causal consistency.
    GetInCausal(GetRequest),
    /// Write a value under writeless-causal consistency (server may coalesce repeated
    /// writes to the same key).
    PutInWritelessCausal(PutRequest),
    /// Read a value under writeless-causal consistency.
    GetInWritelessCausal(GetRequest),
}

impl Request {
    /// The key this request operates on.
    pub fn key(&self) -> &ClientKey {
        match self {
            Request::PutInCausal(put) | Request::PutInWritelessCausal(put) => &put.key,
            Request::GetInCausal(get) | Request::GetInWritelessCausal(get) => &get.key,
        }
    }

    /// The causal context the issuing session observed when sending this request.
    pub fn vector_clock(&self) -> &VectorClock {
        match self {
            Request::PutInCausal(put) | Request::PutInWritelessCausal(put) => &put.vector_clock,
            Request::GetInCausal(get) | Request::GetInWritelessCausal(get) => &get.vector_clock,
        }
    }
}

/// Payload of the two put-style RPCs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PutRequest {
    /// The key that should be updated.
    pub key: ClientKey,
    /// The new value.
    pub value: String,
    /// The client session's current causal context.
    pub vector_clock: VectorClock,
    /// Wall-clock send time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Payload of the two get-style RPCs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GetRequest {
    /// The key to read.
    pub key: ClientKey,
    /// The client session's current causal context.
    pub vector_clock: VectorClock,
    /// Wall-clock send time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}
