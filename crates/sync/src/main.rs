// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! crsyncd - The declaration sync daemon.
//!
//! Wires a JSONL-backed declaration queue and the HTTP gateway transport
//! to the recurring scheduler, with a connectivity probe gating passes
//! while offline.
//!
//! Usage:
//!   crsyncd --config <path>

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cr_sync::{
    Config, HttpTransport, JsonlStore, OnlineFlag, Scheduler, SyncEngine,
};

/// How often the connectivity probe re-checks the gateway.
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_config_path(&args);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&config_path).await {
        tracing::error!("crsyncd failed: {e}");
        std::process::exit(1);
    }
}

fn parse_config_path(args: &[String]) -> PathBuf {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            if let Some(path) = iter.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from("crsync.toml")
}

async fn run(config_path: &std::path::Path) -> cr_sync::Result<()> {
    let config = Config::load(config_path)?;
    tracing::info!(
        url = %config.url,
        store = %config.store_path.display(),
        interval_secs = config.sync.interval_secs,
        "crsyncd starting"
    );

    let store = Arc::new(JsonlStore::open(&config.store_path)?);
    let transport = Arc::new(HttpTransport::new(
        config.url.clone(),
        config.sync.request_timeout(),
    )?);
    let connectivity = Arc::new(OnlineFlag::default());

    tokio::spawn(probe_loop(
        Arc::clone(&connectivity),
        config.url.clone(),
        config.sync.request_timeout(),
    ));

    let engine = Arc::new(SyncEngine::new(
        store,
        transport,
        connectivity,
        config.sync.engine_config(),
    ));

    // Recover anything a previous process left marked in flight.
    let requeued = engine.requeue_hanging()?;
    if requeued > 0 {
        tracing::info!(count = requeued, "requeued declarations from previous run");
    }

    let scheduler = Scheduler::new(engine, config.sync.interval());
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    scheduler.stop();

    Ok(())
}

/// Keeps the shared connectivity flag in step with gateway reachability.
async fn probe_loop(flag: Arc<OnlineFlag>, url: String, timeout: Duration) {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("connectivity probe disabled: {e}");
            return;
        }
    };

    let mut ticker = tokio::time::interval(PROBE_INTERVAL);
    loop {
        ticker.tick().await;
        // Any response at all means the gateway is reachable.
        let online = client.head(&url).send().await.is_ok();
        flag.set_online(online);
    }
}
