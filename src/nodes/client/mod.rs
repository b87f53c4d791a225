//! The client session that runs the causal request protocol against a replica set.

pub use self::selector::{ReplicaSet, Selector};

use crate::{
    config::{ClientConfig, ConsistencyLevel},
    messages::{GetRequest, GetResponse, PutRequest, Request, Response, TcpMessage},
    metrics::ClientMetrics,
    nodes::{receive_tcp_message, send_tcp_message},
};
use eyre::{eyre, Context, ContextCompat};
use hydris_api::{lattice::causal::VectorClock, ClientKey};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::net::TcpStream;

mod selector;

/// A client session against a `hydris` replica set.
///
/// The session carries the causal context of one logical client: a [`VectorClock`] that is
/// replaced wholesale by every successfully adopted reply, and a [`Selector`] that decides
/// which replica the next single-replica operation targets. Both are owned exclusively by the
/// session; concurrent load generation must use one independent session per logical client.
///
/// Operations report their outcome as a plain success flag (plus the value for reads). The
/// two failure channels behave differently:
///
/// - *Transport errors* (connection refused, per-attempt timeout) abort the operation
///   immediately and report failure; they are never retried against another replica.
/// - *Application failures* (the replica answered but declined) advance the selector and
///   retry against the next replica. By default this retry loop is unbounded: a fully
///   partitioned replica set blocks the caller forever, trading liveness for the chance to
///   serve a causally consistent result. Set [`ClientConfig::deadline`] to bound it.
pub struct CausalClient {
    replicas: ReplicaSet,
    selector: Selector,
    vector_clock: VectorClock,
    consistency_level: ConsistencyLevel,
    quorum_reads: bool,
    timeout: Duration,
    deadline: Option<Duration>,
    metrics: Arc<ClientMetrics>,
}

impl CausalClient {
    /// Creates a new session from the given config.
    ///
    /// Fails fast if the replica list is empty. The session clock starts with one zero
    /// entry per configured replica, equivalent to the empty clock under dominance.
    pub fn new(config: ClientConfig) -> eyre::Result<Self> {
        Self::with_metrics(config, Arc::new(ClientMetrics::default()))
    }

    /// Creates a new session that records into the given shared metrics handle.
    ///
    /// Load drivers pass one handle to all sessions to aggregate process-wide counts.
    pub fn with_metrics(config: ClientConfig, metrics: Arc<ClientMetrics>) -> eyre::Result<Self> {
        let replicas = ReplicaSet::new(config.replicas)?;
        let selector = Selector::new(&replicas, config.initial_target);
        let vector_clock = VectorClock::seeded(replicas.iter().map(|addr| addr.to_string()));
        Ok(Self {
            replicas,
            selector,
            vector_clock,
            consistency_level: config.consistency_level,
            quorum_reads: config.quorum_reads,
            timeout: config.timeout,
            deadline: config.deadline,
            metrics,
        })
    }

    /// The session's current causal context.
    pub fn vector_clock(&self) -> &VectorClock {
        &self.vector_clock
    }

    /// The metrics handle this session records into.
    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Re-targets a uniformly random replica for subsequent single-replica operations.
    pub fn retarget_random(&mut self) {
        self.selector.retarget_random();
    }

    /// Writes a value under the session's configured consistency level.
    pub async fn put(&mut self, key: ClientKey, value: String) -> bool {
        match self.consistency_level {
            ConsistencyLevel::Causal => self.put_in_causal(key, value).await,
            ConsistencyLevel::WritelessCausal => self.put_in_writeless_causal(key, value).await,
        }
    }

    /// Reads a value under the session's configured consistency level and quorum setting.
    pub async fn get(&mut self, key: ClientKey) -> (String, bool) {
        match (self.consistency_level, self.quorum_reads) {
            (ConsistencyLevel::Causal, false) => self.get_in_causal(key).await,
            (ConsistencyLevel::Causal, true) => self.get_in_causal_with_quorum(key).await,
            (ConsistencyLevel::WritelessCausal, _) => self.get_in_writeless_causal(key).await,
        }
    }

    /// Writes a value under causal consistency against the currently targeted replica.
    ///
    /// Keeps retrying against the next replica while the current one declines the write.
    pub async fn put_in_causal(&mut self, key: ClientKey, value: String) -> bool {
        let request = Request::PutInCausal(PutRequest {
            key,
            value,
            vector_clock: self.vector_clock.clone(),
            timestamp: now_millis(),
        });
        self.put_with_failover(request).await
    }

    /// Writes a value under writeless-causal consistency.
    ///
    /// Identical control flow to [`put_in_causal`][Self::put_in_causal]; the write
    /// coalescing happens on the server and is opaque to this client.
    pub async fn put_in_writeless_causal(&mut self, key: ClientKey, value: String) -> bool {
        let request = Request::PutInWritelessCausal(PutRequest {
            key,
            value,
            vector_clock: self.vector_clock.clone(),
            timestamp: now_millis(),
        });
        self.put_with_failover(request).await
    }

    /// Reads a value under causal consistency from the currently targeted replica.
    pub async fn get_in_causal(&mut self, key: ClientKey) -> (String, bool) {
        self.get_with_failover(key, false).await
    }

    /// Reads a value under writeless-causal consistency.
    pub async fn get_in_writeless_causal(&mut self, key: ClientKey) -> (String, bool) {
        self.get_with_failover(key, true).await
    }

    /// Reads a value by polling **every** replica and keeping the causally latest reply.
    ///
    /// This is the read side of the read-all/write-one quorum discipline: writes go to a
    /// single replica, quorum reads compensate by fetching from all of them. Replies are
    /// ranked by strict clock dominance against an all-zero baseline; for mutually
    /// concurrent replies the earliest reply in replica-index order is kept, which makes the
    /// tie-break deterministic for fixed inputs.
    ///
    /// A transport error against any single replica aborts the entire quorum read
    /// (fail-fast, never a partial quorum). If the sweep produced no adoptable reply, the
    /// selector advances and the whole sweep is repeated.
    pub async fn get_in_causal_with_quorum(&mut self, key: ClientKey) -> (String, bool) {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);
        let addrs: Vec<SocketAddr> = self.replicas.iter().collect();

        loop {
            let request = Request::GetInCausal(GetRequest {
                key: key.clone(),
                vector_clock: self.vector_clock.clone(),
                timestamp: now_millis(),
            });

            // declined baseline reply carrying the all-zero clock; no real reply can be
            // dominated by it
            let mut best = GetResponse {
                success: false,
                value: String::new(),
                vector_clock: Some(VectorClock::seeded(
                    addrs.iter().map(|addr| addr.to_string()),
                )),
            };

            for &addr in &addrs {
                let reply = match self.exchange(addr, request.clone()).await {
                    Ok(Response::Get(reply)) => reply,
                    Ok(other) => {
                        log::error!("unexpected reply to quorum get from {}: {:?}", addr, other);
                        return (String::new(), false);
                    }
                    Err(err) => {
                        log::error!("quorum get aborted, attempt against {} failed: {:#}", addr, err);
                        return (String::new(), false);
                    }
                };
                if reply
                    .vector_clock_or_zero()
                    .dominates(&best.vector_clock_or_zero())
                {
                    best = reply;
                }
            }

            let GetResponse {
                success,
                value,
                vector_clock,
            } = best;
            if let (true, Some(clock)) = (success, vector_clock) {
                self.vector_clock = clock;
                return (value, true);
            }

            let next = self.failover("quorum get");
            log::info!("retrying quorum sweep, new target replica {}", next);
            if deadline_expired(deadline) {
                return (String::new(), false);
            }
        }
    }

    async fn put_with_failover(&mut self, request: Request) -> bool {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);

        loop {
            let addr = self.replicas.addr(self.selector.current());
            let reply = match self.exchange(addr, request.clone()).await {
                Ok(Response::Put(reply)) => reply,
                Ok(other) => {
                    log::error!("unexpected reply to put from {}: {:?}", addr, other);
                    return false;
                }
                Err(err) => {
                    log::error!("put attempt against {} failed: {:#}", addr, err);
                    return false;
                }
            };

            if let (true, Some(clock)) = (reply.success, reply.vector_clock) {
                self.vector_clock = clock;
                return true;
            }

            let next = self.failover("put");
            log::info!("put declined by {}, failing over to replica {}", addr, next);
            if deadline_expired(deadline) {
                return false;
            }
        }
    }

    async fn get_with_failover(&mut self, key: ClientKey, writeless: bool) -> (String, bool) {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);

        loop {
            let get = GetRequest {
                key: key.clone(),
                vector_clock: self.vector_clock.clone(),
                timestamp: now_millis(),
            };
            let request = if writeless {
                Request::GetInWritelessCausal(get)
            } else {
                Request::GetInCausal(get)
            };

            let addr = self.replicas.addr(self.selector.current());
            let reply = match self.exchange(addr, request).await {
                Ok(Response::Get(reply)) => reply,
                Ok(other) => {
                    log::error!("unexpected reply to get from {}: {:?}", addr, other);
                    return (String::new(), false);
                }
                Err(err) => {
                    log::error!("get attempt against {} failed: {:#}", addr, err);
                    return (String::new(), false);
                }
            };

            if let (true, Some(clock)) = (reply.success, reply.vector_clock) {
                self.vector_clock = clock;
                return (reply.value, true);
            }

            let next = self.failover("get");
            log::info!("get declined by {}, failing over to replica {}", addr, next);
            if deadline_expired(deadline) {
                return (String::new(), false);
            }
        }
    }

    /// Performs one bounded RPC attempt: connect, send, await the reply.
    ///
    /// The whole exchange shares a single timeout; exceeding it is a transport error like
    /// any other.
    async fn exchange(&self, addr: SocketAddr, request: Request) -> eyre::Result<Response> {
        let attempt = async {
            let stream = TcpStream::connect(addr)
                .await
                .context("failed to connect to tcp stream")?;
            stream
                .set_nodelay(true)
                .context("failed to set nodelay for tcpstream")?;
            let (mut receiver, mut sender) = stream.into_split();

            send_tcp_message(&TcpMessage::Request(request), &mut sender).await?;
            let message = receive_tcp_message(&mut receiver).await?;
            let message = message.context("connection closed")?;

            match message {
                TcpMessage::Response(response) => Ok(response),
                other => Err(eyre!("expected Response, got `{:?}`", other)),
            }
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(eyre!(
                "rpc attempt against {} timed out after {:?}",
                addr,
                self.timeout
            )),
        }
    }

    fn failover(&mut self, op: &str) -> usize {
        self.metrics.record_failover();
        let next = self.selector.advance();
        log::trace!("{} failover, selector now targeting index {}", op, next);
        next
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn deadline_expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|at| Instant::now() >= at)
}
