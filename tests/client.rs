//! Integration tests for the causal client protocol, run against scripted in-process
//! replicas.

use hydris::{
    config::{ClientConfig, ConsistencyLevel},
    lattice::causal::VectorClock,
    messages::{GetResponse, PutResponse, Request, Response, TcpMessage},
    nodes::{receive_tcp_message, send_tcp_message},
    CausalClient,
};
use pretty_assertions::assert_eq;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

/// Logger that is set up for tests if the `RUST_LOG` environment variable is set.
///
/// Multiple tests might run in the same process, so errors because of an already
/// initialized logger are ignored.
fn set_up_logger() {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        if let Ok(level) = filter.parse() {
            let _ = fern::Dispatch::new()
                .level(level)
                .chain(std::io::stdout())
                .apply();
        }
    }
}

/// An in-process replica answering one request per connection according to a script.
///
/// The script receives the request and the number of requests this replica has already
/// served, so tests can make a replica change its mind between sweeps.
struct MockReplica {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockReplica {
    async fn spawn(
        mut script: impl FnMut(&Request, usize) -> Response + Send + 'static,
    ) -> MockReplica {
        set_up_logger();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<Request>>> = Default::default();
        let seen = requests.clone();

        tokio::spawn(async move {
            let mut served = 0;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let (mut receiver, mut sender) = stream.into_split();
                let Ok(Some(TcpMessage::Request(request))) =
                    receive_tcp_message(&mut receiver).await
                else {
                    continue;
                };
                let response = script(&request, served);
                served += 1;
                seen.lock().unwrap().push(request);
                let _ = send_tcp_message(&TcpMessage::Response(response), &mut sender).await;
            }
        });

        MockReplica { addr, requests }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

/// An address that refuses connections (the listener is bound and dropped immediately).
async fn dead_replica() -> SocketAddr {
    set_up_logger();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn clock(entries: &[(&str, u64)]) -> VectorClock {
    VectorClock::from_map(entries.iter().map(|(id, n)| (id.to_string(), *n)).collect())
}

fn ok_put(entries: &[(&str, u64)]) -> Response {
    Response::Put(PutResponse {
        success: true,
        vector_clock: Some(clock(entries)),
    })
}

fn declined_put() -> Response {
    Response::Put(PutResponse {
        success: false,
        vector_clock: None,
    })
}

fn ok_get(value: &str, entries: &[(&str, u64)]) -> Response {
    Response::Get(GetResponse {
        success: true,
        value: value.to_owned(),
        vector_clock: Some(clock(entries)),
    })
}

fn declined_get() -> Response {
    Response::Get(GetResponse {
        success: false,
        value: String::new(),
        vector_clock: None,
    })
}

fn test_config(replicas: Vec<SocketAddr>) -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_secs(2),
        ..ClientConfig::new(replicas)
    }
}

fn answer(request: &Request, value: &str, entries: &[(&str, u64)]) -> Response {
    match request {
        Request::PutInCausal(_) | Request::PutInWritelessCausal(_) => ok_put(entries),
        Request::GetInCausal(_) | Request::GetInWritelessCausal(_) => ok_get(value, entries),
    }
}

#[tokio::test]
async fn put_then_get_adopts_replica_clock() {
    let replica = MockReplica::spawn(|request, _| answer(request, "v1", &[("R0", 1)])).await;
    let mut client = CausalClient::new(test_config(vec![replica.addr])).unwrap();

    // session clock starts equivalent to empty
    assert_eq!(
        client.vector_clock().compare(&VectorClock::new()),
        hydris::lattice::causal::ClockOrdering::Equal
    );

    assert!(client.put("k".into(), "v1".into()).await);
    assert_eq!(client.vector_clock(), &clock(&[("R0", 1)]));

    let (value, found) = client.get("k".into()).await;
    assert!(found);
    assert_eq!(value, "v1");
    assert_eq!(client.vector_clock(), &clock(&[("R0", 1)]));
}

#[tokio::test]
async fn requests_carry_the_session_clock() {
    let replica = MockReplica::spawn(|request, _| answer(request, "v", &[("R0", 5)])).await;
    let mut client = CausalClient::new(test_config(vec![replica.addr])).unwrap();

    assert!(client.put("k".into(), "v".into()).await);
    let (_, found) = client.get("k".into()).await;
    assert!(found);

    let requests = replica.requests();
    assert_eq!(requests.len(), 2);
    // the get was issued after the put adopted {R0: 5}
    assert_eq!(requests[1].vector_clock(), &clock(&[("R0", 5)]));
}

#[tokio::test]
async fn declined_put_fails_over_to_next_replica() {
    let first = MockReplica::spawn(|_, _| declined_put()).await;
    let second = MockReplica::spawn(|_, _| ok_put(&[("R1", 7)])).await;
    let mut client = CausalClient::new(test_config(vec![first.addr, second.addr])).unwrap();

    assert!(client.put("k".into(), "v".into()).await);

    // the session adopted the second replica's clock, not the first's
    assert_eq!(client.vector_clock(), &clock(&[("R1", 7)]));
    assert_eq!(first.request_count(), 1);
    assert_eq!(second.request_count(), 1);
    assert_eq!(client.metrics().failovers(), 1);
}

#[tokio::test]
async fn failover_is_round_robin_over_all_replicas() {
    let r0 = MockReplica::spawn(|_, _| declined_put()).await;
    let r1 = MockReplica::spawn(|_, _| declined_put()).await;
    let r2 = MockReplica::spawn(|_, _| ok_put(&[("R2", 1)])).await;
    let mut client = CausalClient::new(test_config(vec![r0.addr, r1.addr, r2.addr])).unwrap();

    assert!(client.put("k".into(), "v".into()).await);

    // every replica was tried exactly once before the write landed
    assert_eq!(r0.request_count(), 1);
    assert_eq!(r1.request_count(), 1);
    assert_eq!(r2.request_count(), 1);
    assert_eq!(client.vector_clock(), &clock(&[("R2", 1)]));
}

#[tokio::test]
async fn transport_error_aborts_put_without_failover() {
    let dead = dead_replica().await;
    let alive = MockReplica::spawn(|_, _| ok_put(&[("R1", 1)])).await;
    let mut client = CausalClient::new(test_config(vec![dead, alive.addr])).unwrap();

    // connection refused aborts the operation; the healthy replica is never consulted
    assert!(!client.put("k".into(), "v".into()).await);
    assert_eq!(alive.request_count(), 0);
    assert_eq!(client.metrics().failovers(), 0);
}

#[tokio::test]
async fn transport_error_aborts_get() {
    let dead = dead_replica().await;
    let mut client = CausalClient::new(test_config(vec![dead])).unwrap();

    let (value, found) = client.get("k".into()).await;
    assert!(!found);
    assert_eq!(value, "");
}

#[tokio::test]
async fn quorum_get_returns_causally_latest_reply() {
    let r0 = MockReplica::spawn(|_, _| ok_get("old", &[("R0", 2)])).await;
    let r1 = MockReplica::spawn(|_, _| ok_get("new", &[("R0", 2), ("R1", 1)])).await;
    let r2 = MockReplica::spawn(|_, _| ok_get("old", &[("R0", 2)])).await;

    let mut config = test_config(vec![r0.addr, r1.addr, r2.addr]);
    config.quorum_reads = true;
    let mut client = CausalClient::new(config).unwrap();

    let (value, found) = client.get("k".into()).await;
    assert!(found);
    assert_eq!(value, "new");
    assert_eq!(client.vector_clock(), &clock(&[("R0", 2), ("R1", 1)]));

    // every replica was polled exactly once
    assert_eq!(r0.request_count(), 1);
    assert_eq!(r1.request_count(), 1);
    assert_eq!(r2.request_count(), 1);
}

#[tokio::test]
async fn quorum_tie_break_keeps_earliest_concurrent_reply() {
    // the two replies are mutually concurrent; the reply of the lower-indexed replica wins
    let r0 = MockReplica::spawn(|_, _| ok_get("first", &[("R0", 1)])).await;
    let r1 = MockReplica::spawn(|_, _| ok_get("second", &[("R1", 1)])).await;

    let mut config = test_config(vec![r0.addr, r1.addr]);
    config.quorum_reads = true;
    let mut client = CausalClient::new(config).unwrap();

    let (value, found) = client.get("k".into()).await;
    assert!(found);
    assert_eq!(value, "first");
    assert_eq!(client.vector_clock(), &clock(&[("R0", 1)]));
}

#[tokio::test]
async fn quorum_aborts_on_single_transport_error() {
    let r0 = MockReplica::spawn(|_, _| ok_get("old", &[("R0", 2)])).await;
    let r1 = MockReplica::spawn(|_, _| ok_get("new", &[("R0", 2), ("R1", 1)])).await;
    let r2 = dead_replica().await;

    let mut config = test_config(vec![r0.addr, r1.addr, r2]);
    config.quorum_reads = true;
    let mut client = CausalClient::new(config).unwrap();

    let before = client.vector_clock().clone();
    let (value, found) = client.get("k".into()).await;

    // the sweep fails as a whole even though r1's reply dominates r0's
    assert!(!found);
    assert_eq!(value, "");
    assert_eq!(client.vector_clock(), &before);
}

#[tokio::test]
async fn quorum_repeats_sweep_until_a_reply_is_adoptable() {
    // declines the first sweep, serves the second
    let replica = MockReplica::spawn(|_, served| {
        if served == 0 {
            declined_get()
        } else {
            ok_get("v", &[("R0", 1)])
        }
    })
    .await;

    let mut config = test_config(vec![replica.addr]);
    config.quorum_reads = true;
    let mut client = CausalClient::new(config).unwrap();

    let (value, found) = client.get("k".into()).await;
    assert!(found);
    assert_eq!(value, "v");
    assert_eq!(replica.request_count(), 2);
    assert_eq!(client.metrics().failovers(), 1);
}

#[tokio::test]
async fn writeless_level_uses_writeless_rpcs() {
    let replica = MockReplica::spawn(|request, _| match request {
        Request::PutInWritelessCausal(_) => ok_put(&[("R0", 1)]),
        Request::GetInWritelessCausal(_) => ok_get("v", &[("R0", 1)]),
        other => panic!("unexpected rpc {:?}", other),
    })
    .await;

    let mut config = test_config(vec![replica.addr]);
    config.consistency_level = ConsistencyLevel::WritelessCausal;
    let mut client = CausalClient::new(config).unwrap();

    assert!(client.put("k".into(), "v".into()).await);
    let (value, found) = client.get("k".into()).await;
    assert!(found);
    assert_eq!(value, "v");

    let requests = replica.requests();
    assert!(matches!(requests[0], Request::PutInWritelessCausal(_)));
    assert!(matches!(requests[1], Request::GetInWritelessCausal(_)));
}

#[tokio::test]
async fn deadline_bounds_the_retry_loop() {
    let replica = MockReplica::spawn(|_, _| declined_put()).await;

    let mut config = test_config(vec![replica.addr]);
    config.deadline = Some(Duration::from_millis(200));
    let mut client = CausalClient::new(config).unwrap();

    // without the deadline this put would retry forever
    assert!(!client.put("k".into(), "v".into()).await);
    assert!(client.metrics().failovers() >= 1);
}
