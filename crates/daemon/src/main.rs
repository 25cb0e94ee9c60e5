#![forbid(unsafe_code)]

//! Activity store daemon.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use habit_daemon::{api, config::DaemonConfig, open_store};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "habit-daemon", version, about = "Habit tracking REST backend")]
struct Cli {
    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(long, default_value = "127.0.0.1:8000")]
    listen: SocketAddr,

    /// SQLite database file.
    #[arg(long, default_value = ".habits/habits.db")]
    db_path: PathBuf,

    /// Keep everything in memory (nothing is persisted).
    #[arg(long, default_value_t = false)]
    in_memory: bool,

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

    let config = DaemonConfig {
        listen: cli.listen,
        db_path: cli.db_path,
        in_memory: cli.in_memory,
    };
    info!("starting daemon with config: {:?}", config);

    let store = open_store(&config)?;
    let app = api::router(api::AppState::new(store)?);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
