//! Health probe transport.
//!
//! A probe is a plain `GET` against the backend's health URL. Exactly
//! `200 OK` is healthy; any other status, a transport error or a timeout
//! is not. The response body is never read.

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend answered `200 OK`.
    Healthy,
    /// The backend answered with another status.
    Status(StatusCode),
    /// The request could not be built or the connection failed.
    Failed(String),
    /// No response within the probe timeout.
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }

    /// Classify an HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::OK {
            ProbeOutcome::Healthy
        } else {
            ProbeOutcome::Status(status)
        }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Healthy => write!(f, "healthy"),
            ProbeOutcome::Status(status) => write!(f, "non-200 status {}", status),
            ProbeOutcome::Failed(e) => write!(f, "connection error: {}", e),
            ProbeOutcome::TimedOut => write!(f, "timeout"),
        }
    }
}

/// Something that can check a health URL.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, url: &Url) -> impl Future<Output = ProbeOutcome> + Send;
}

/// HTTP prober sharing one connection pool across all health checkers.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpProbe {
    /// Create a prober whose every exchange is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, url: &Url) -> ProbeOutcome {
        let uri: Uri = match url.as_str().parse() {
            Ok(uri) => uri,
            Err(e) => return ProbeOutcome::Failed(format!("invalid health check url: {}", e)),
        };

        let request = match Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", "round-robin-balancer-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return ProbeOutcome::Failed(e.to_string()),
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => ProbeOutcome::from_status(response.status()),
            Ok(Err(e)) => ProbeOutcome::Failed(e.to_string()),
            Err(_) => ProbeOutcome::TimedOut,
        }
    }
}
