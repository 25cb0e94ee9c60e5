#![forbid(unsafe_code)]

//! Habit activity simulator.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use habit_simulator::{http, Catalog, HttpActivityStore, Simulator, SimulatorConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "habit-simulator", version, about = "Synthetic habit activity generator")]
struct Cli {
    /// Control surface listen address.
    #[arg(long, default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    /// Activity store base URL.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    store_url: String,

    /// Initial seconds between generation events.
    #[arg(long, default_value_t = 10.0)]
    interval_secs: f64,

    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    #[arg(long, default_value_t = habit_simulator::catalog::DEFAULT_CATALOG_SIZE)]
    catalog_size: usize,

    /// Seed for catalog generation (reproducible task list).
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let interval = Duration::try_from_secs_f64(cli.interval_secs)
        .ok()
        .filter(|d| !d.is_zero())
        .with_context(|| format!("invalid --interval-secs {}", cli.interval_secs))?;

    let config = SimulatorConfig {
        listen: cli.listen,
        store_url: cli.store_url,
        interval,
        request_timeout: Duration::from_millis(cli.request_timeout_ms),
        catalog_size: cli.catalog_size,
        seed: cli.seed,
        ..SimulatorConfig::default()
    };
    info!("starting simulator with config: {:?}", config);

    let catalog = Catalog::seeded(config.catalog_size, config.seed);
    let store = HttpActivityStore::new(config.store_url.clone(), config.request_timeout)
        .context("building activity store client")?;
    let sim = Simulator::new(catalog, store, &config);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, http::router(sim.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sim.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
