//! Defines the wire contract between clients and replica servers.
//!
//! A replica answers four RPCs: `PutInCausal`, `GetInCausal`, and their writeless-causal
//! twins. Every request carries the client session's current [`VectorClock`] as causal
//! context plus a wall-clock timestamp; every reply carries a success flag and, on success,
//! the replica's current clock, which the session adopts wholesale.
//!
//! [`VectorClock`]: hydris_api::lattice::causal::VectorClock

pub use self::{
    request::{GetRequest, PutRequest, Request},
    response::{GetResponse, PutResponse, Response},
};

pub mod request;
pub mod response;

/// The message type that `hydris` nodes send over TCP.
///
/// Messages are framed by [`send_tcp_message`][crate::nodes::send_tcp_message] and
/// [`receive_tcp_message`][crate::nodes::receive_tcp_message].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TcpMessage {
    /// A client request to a replica.
    Request(Request),
    /// A replica's reply to a [`Request`].
    Response(Response),
}
