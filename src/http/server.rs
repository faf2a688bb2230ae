//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend pool, forwarder and dispatcher from configuration
//! - Create Axum Router sending every request to the dispatcher
//! - Wire up middleware (request ID, tracing)
//! - Spawn one health checker per backend
//! - Graceful shutdown with a bounded drain period

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tokio::time;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::BalancerConfig;
use crate::health::{HealthChecker, HttpProbe};
use crate::http::dispatcher::Dispatcher;
use crate::http::forward::{Forwarder, HttpForwarder};
use crate::http::X_REQUEST_ID;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendPool, PoolError};

/// Error running the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("stop failed: in-flight requests did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

/// HTTP front door of the load balancer.
pub struct HttpServer<F = HttpForwarder> {
    config: BalancerConfig,
    dispatcher: Arc<Dispatcher<F>>,
}

impl HttpServer {
    /// Create a server forwarding over HTTP with the configured connect timeout.
    pub fn new(config: BalancerConfig) -> Result<Self, PoolError> {
        let forwarder = HttpForwarder::new(config.timeouts.forward());
        Self::with_forwarder(config, forwarder)
    }
}

impl<F: Forwarder> HttpServer<F> {
    /// Create a server with a custom forwarding capability.
    pub fn with_forwarder(config: BalancerConfig, forwarder: F) -> Result<Self, PoolError> {
        let pool = Arc::new(BackendPool::from_config(&config)?);
        let dispatcher = Arc::new(Dispatcher::new(pool, forwarder));
        Ok(Self { config, dispatcher })
    }

    /// The backend pool requests are balanced over.
    pub fn pool(&self) -> &Arc<BackendPool> {
        self.dispatcher.pool()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(dispatcher: Arc<Dispatcher<F>>) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id());

        Router::new()
            .route("/{*path}", any(proxy_handler::<F>))
            .route("/", any(proxy_handler::<F>))
            .with_state(dispatcher)
            .layer(middleware)
    }

    /// Spawn one health checker per backend, all sharing one probe client.
    fn spawn_health_checkers(&self, shutdown: &Shutdown) -> JoinSet<()> {
        let probe = HttpProbe::new(self.config.health_check.timeout());
        let interval = self.config.health_check.interval();

        let mut checkers = JoinSet::new();
        for backend in self.pool().backends() {
            let checker = HealthChecker::new(backend.clone(), probe.clone(), interval);
            checkers.spawn(checker.run(shutdown.subscribe()));
        }
        checkers
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    ///
    /// Returns `ServerError::ShutdownTimeout` if draining takes longer than
    /// the configured shutdown grace period.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool().len(),
            balance = %self.config.balance,
            "HTTP server starting"
        );

        let mut stop = shutdown.subscribe();
        let mut serve_stop = shutdown.subscribe();
        let mut checkers = self.spawn_health_checkers(&shutdown);

        let app = Self::build_router(self.dispatcher.clone())
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { serve_stop.recv().await })
                .await
        });

        tokio::select! {
            result = &mut server => {
                // Both receivers see the same trigger, so the drained server
                // can win this race. Checkers exit on their own then.
                if !shutdown.is_triggered() {
                    checkers.abort_all();
                }
                result??;
            }
            _ = stop.recv() => {
                let grace = self.config.timeouts.shutdown();
                tracing::info!(grace = ?grace, "Stopping: draining in-flight requests");

                match time::timeout(grace, &mut server).await {
                    Ok(result) => result??,
                    Err(_) => {
                        server.abort();
                        checkers.abort_all();
                        tracing::error!(grace = ?grace, "Stop failed: shutdown timeout exceeded");
                        return Err(ServerError::ShutdownTimeout(grace));
                    }
                }
            }
        }

        while let Some(result) = checkers.join_next().await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Health checker task failed");
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes through the dispatcher.
async fn proxy_handler<F: Forwarder>(
    State(dispatcher): State<Arc<Dispatcher<F>>>,
    request: Request<Body>,
) -> Response {
    dispatcher.handle(request).await
}
