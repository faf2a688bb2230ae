//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                 LOAD BALANCER                 │
//!                         │                                               │
//!   Client Request        │  ┌──────────┐    ┌────────────┐               │
//!   ──────────────────────┼─▶│   http   │───▶│ dispatcher │               │
//!                         │  │  server  │    └─────┬──────┘               │
//!                         │  └──────────┘          │ select()             │
//!                         │                        ▼                      │
//!                         │                 ┌──────────────┐              │
//!                         │                 │ backend pool │◀── health ◀──┼── GET /health
//!                         │                 │ (round robin)│   checkers   │   per backend
//!                         │                 └──────┬───────┘              │
//!                         │                        ▼                      │
//!   Client Response       │                 ┌──────────────┐              │
//!   ◀─────────────────────┼─────────────────│   forward    │◀─────────────┼──── Backend
//!   (or 502)              │                 └──────────────┘              │
//!                         └───────────────────────────────────────────────┘
//! ```

use clap::Parser;

use round_robin_balancer::config::cli::Cli;
use round_robin_balancer::lifecycle::{signals, startup, Shutdown};
use round_robin_balancer::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config().inspect_err(|e| {
        eprintln!("configuration error: {}", e);
    })?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        hosts = config.hosts.len(),
        balance = %config.balance,
        health_check_path = %config.health_check.path,
        health_check_interval_ms = config.health_check.interval_ms,
        health_check_timeout_ms = config.health_check.timeout_ms,
        forward_timeout_ms = config.timeouts.forward_ms,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
