//! Minimal example: put a value, read it back.

use argh::FromArgs;
use eyre::Context;
use hydris::{config::ClientConfig, CausalClient};
use std::{net::SocketAddr, time::Duration};

#[derive(FromArgs)]
/// put a timestamp value into hydris and read it back
struct Args {
    /// comma-separated replica addresses
    #[argh(option, short = 's')]
    servers: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let args: Args = argh::from_env();
    let replicas = args
        .servers
        .split(',')
        .map(|addr| {
            addr.trim()
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid replica address `{}`", addr))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    let mut client = CausalClient::new(ClientConfig::new(replicas))?;

    // put the value
    let time = format!("{}", chrono::Utc::now());
    if !client.put("time".into(), time).await {
        eyre::bail!("failed to PUT `time`");
    }
    println!("Successfully PUT `time`");

    // sleep 1 second
    tokio::time::sleep(Duration::from_secs(1)).await;

    // get the value
    let (value, found) = client.get("time".into()).await;
    if !found {
        eyre::bail!("failed to GET `time`");
    }
    println!("Successfully GET `time`: {}", value);

    Ok(())
}
