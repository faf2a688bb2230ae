//! Startup orchestration.
//!
//! Order: optional metrics exporter, then the backend pool (fails fast on
//! bad hosts), then the listener. Traffic is only accepted once everything
//! it depends on exists.

use metrics_exporter_prometheus::BuildError;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::BalancerConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::load_balancer::PoolError;
use crate::observability::metrics;

/// Fatal error while starting or running the balancer.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("backend pool: {0}")]
    Pool(#[from] PoolError),

    #[error("listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Start every subsystem and serve until `shutdown` fires.
pub async fn run(config: BalancerConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config)?;

    let address = server.config().listener.socket_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let local_addr = listener.local_addr().map_err(ServerError::Io)?;
    tracing::info!(
        address = %local_addr,
        hosts = ?server.config().hosts,
        "Started"
    );

    server.run(listener, shutdown).await?;
    Ok(())
}
