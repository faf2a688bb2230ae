//! Request dispatch: pick a backend, forward, or reject.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::forward::{Forwarder, HttpForwarder};
use crate::http::X_REQUEST_ID;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

/// Body of the response sent when no backend can take the request.
pub const EMPTY_POOL_BODY: &str = "empty proxy pool";

/// Entry point for every proxied request.
#[derive(Debug)]
pub struct Dispatcher<F = HttpForwarder> {
    pool: Arc<BackendPool>,
    forwarder: F,
}

impl<F: Forwarder> Dispatcher<F> {
    pub fn new(pool: Arc<BackendPool>, forwarder: F) -> Self {
        Self { pool, forwarder }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Forward `request` to the next eligible backend.
    ///
    /// Both an exhausted pool and a transport failure against the chosen
    /// backend produce the same `502 empty proxy pool` response. The
    /// request is never re-sent to another backend.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start_time = Instant::now();
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(backend) = self.pool.select() else {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No healthy backends");
            metrics::record_pool_exhausted();
            metrics::record_request(method.as_str(), StatusCode::BAD_GATEWAY.as_u16(), "none", start_time);
            return empty_pool_response();
        };

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            backend = %backend.address(),
            "Proxying request"
        );

        match self.forwarder.forward(&backend, request).await {
            Ok(response) => {
                metrics::record_request(
                    method.as_str(),
                    response.status().as_u16(),
                    backend.address(),
                    start_time,
                );
                response
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    backend = %backend.address(),
                    error = %e,
                    "Upstream error"
                );
                metrics::record_request(
                    method.as_str(),
                    StatusCode::BAD_GATEWAY.as_u16(),
                    backend.address(),
                    start_time,
                );
                empty_pool_response()
            }
        }
    }
}

/// The single error shape seen by callers: `502` with a short plain-text body.
pub fn empty_pool_response() -> Response {
    (StatusCode::BAD_GATEWAY, EMPTY_POOL_BODY).into_response()
}
