//! Load driver: measures put/get latency of the causal client protocol at a configurable
//! read/write ratio, with one independent session per simulated logical client.

use argh::FromArgs;
use eyre::Context;
use hydris::{
    config::{ClientConfig, ConsistencyLevel, InitialTarget},
    metrics::ClientMetrics,
    CausalClient,
};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

#[derive(FromArgs)]
/// hydris benchmark driver
struct Args {
    /// comma-separated replica addresses the clients connect to
    #[argh(option, short = 's')]
    servers: String,

    /// number of concurrent logical clients
    #[argh(option, short = 'c', default = "1")]
    clients: u32,

    /// rounds per client; each round is one put followed by `get-ratio` gets
    #[argh(option, short = 'n', default = "1")]
    rounds: u32,

    /// gets issued per put
    #[argh(option, short = 'g', default = "1")]
    get_ratio: u32,

    /// consistency level: `causal` or `writeless-causal`
    #[argh(option, default = "ConsistencyLevel::Causal", from_str_fn(parse_level))]
    consistency_level: ConsistencyLevel,

    /// read from all replicas and keep the causally latest reply
    #[argh(switch, short = 'q')]
    quorum: bool,

    /// per-attempt rpc timeout in seconds
    #[argh(option, default = "5")]
    timeout_secs: u64,
}

fn parse_level(value: &str) -> Result<ConsistencyLevel, String> {
    match value {
        "causal" => Ok(ConsistencyLevel::Causal),
        "writeless-causal" => Ok(ConsistencyLevel::WritelessCausal),
        other => Err(format!("unknown consistency level `{}`", other)),
    }
}

fn main() -> eyre::Result<()> {
    let args: Args = argh::from_env();

    if let Err(err) = set_up_logger() {
        eprintln!(
            "{:?}",
            eyre::Error::new(err).wrap_err("failed to set up logger")
        );
    }

    let replicas = args
        .servers
        .split(',')
        .map(|addr| {
            addr.trim()
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid replica address `{}`", addr))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    let config = ClientConfig {
        replicas,
        consistency_level: args.consistency_level,
        quorum_reads: args.quorum,
        timeout: Duration::from_secs(args.timeout_secs),
        deadline: None,
        initial_target: InitialTarget::Random,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let metrics = Arc::new(ClientMetrics::default());
    let bench_start = Instant::now();

    let put_latencies = runtime.block_on(run_clients(&args, config, metrics.clone()))?;

    let elapsed = bench_start.elapsed();
    log::info!(
        "finished: {} puts, {} gets, {} failovers in {:.2?}",
        metrics.puts(),
        metrics.gets(),
        metrics.failovers(),
        elapsed
    );
    report_latency(put_latencies);

    Ok(())
}

async fn run_clients(
    args: &Args,
    config: ClientConfig,
    metrics: Arc<ClientMetrics>,
) -> eyre::Result<Vec<Duration>> {
    let mut tasks = Vec::new();
    for _ in 0..args.clients {
        let session_id = format!("bench-client-{}", uuid::Uuid::new_v4());
        let mut client = CausalClient::with_metrics(config.clone(), metrics.clone())?;
        let metrics = metrics.clone();
        let rounds = args.rounds;
        let get_ratio = args.get_ratio;

        tasks.push(tokio::spawn(async move {
            let mut put_latencies = Vec::with_capacity(rounds as usize);

            for _ in 0..rounds {
                let key = format!("key{}", rand::random::<u32>() % 100_000);
                let value = format!("value{}", rand::random::<u32>() % 100_000);

                let put_start = Instant::now();
                let ok = client.put(key.clone().into(), value).await;
                put_latencies.push(put_start.elapsed());
                metrics.record_put();
                if !ok {
                    log::warn!("[{}] put for `{}` failed", session_id, key);
                }

                for _ in 0..get_ratio {
                    let (found_value, ok) = client.get(key.clone().into()).await;
                    metrics.record_get();
                    if ok {
                        log::trace!(
                            "[{}] get `{}` -> `{}`, clock {:?}",
                            session_id,
                            key,
                            found_value,
                            client.vector_clock()
                        );
                    }
                }

                // spread subsequent single-replica operations over the cluster
                client.retarget_random();
            }

            put_latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.context("client task panicked")?);
    }
    Ok(all_latencies)
}

fn report_latency(mut samples: Vec<Duration>) {
    if samples.is_empty() {
        log::info!("no put latency samples collected");
        return;
    }
    samples.sort_unstable();
    let total: Duration = samples.iter().sum();
    let mean = total / samples.len() as u32;
    log::info!(
        "put latency over {} samples: mean {:.2?}, p50 {:.2?}, p95 {:.2?}, p99 {:.2?}",
        samples.len(),
        mean,
        percentile(&samples, 50),
        percentile(&samples, 95),
        percentile(&samples, 99),
    );
}

fn percentile(sorted: &[Duration], p: usize) -> Duration {
    let index = (sorted.len() - 1) * p / 100;
    sorted[index]
}

fn set_up_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
