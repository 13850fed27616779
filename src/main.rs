//! Tool Gate
//!
//! Guards tool endpoints exposed to external callers.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  TOOL GATE                   │
//!   Client Request      │                                              │
//!   ────────────────────┼─▶ request id → trace → timeout → dispatch ──┐ │
//!                       │                                            │ │
//!                       │        ┌───────────── /tools/* ────────────┤ │
//!                       │        ▼                                   │ │
//!                       │   ┌─────────┐   ┌──────────┐   ┌───────┐   │ │
//!                       │   │  auth   │──▶│ identity │──▶│ rate  │   │ │
//!                       │   │  gate   │   │ resolver │   │ limit │   │ │
//!                       │   └─────────┘   └──────────┘   └───┬───┘   │ │
//!                       │        │ 401/503                   │ 429   │ │
//!                       │        ▼                           ▼       │ │
//!                       │   ┌───────────────┐       ┌─────────────┐  │ │
//!   Client Response     │   │ tool handlers │       │ /, /health  │◀─┘ │
//!   ◀───────────────────┼───│ (free slots)  │       │  (bypass)   │    │
//!                       │   └───────────────┘       └─────────────┘    │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use tool_gate::config::load_config;
use tool_gate::observability::{logging, metrics};
use tool_gate::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "tool-gate")]
#[command(about = "Authenticating, rate-limiting gate for tool endpoints", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = std::env::var("GATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    logging::init_logging(&level);
    tracing::info!("tool-gate v{} starting", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_deref())?;
    let config = loaded.config;

    for warning in &loaded.warnings {
        tracing::error!(%warning, "Gate misconfiguration, affected requests will be refused");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        auth = ?config.auth,
        rate_limit = ?config.rate_limit,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown.trigger_on_signal().await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
