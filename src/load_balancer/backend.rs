//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Own the health-check target derived from the backend address
//! - Track health state behind a per-backend lock
//!
//! The health flag has exactly one writer (the backend's own health
//! checker) and many readers (request selection). Each backend owns its
//! lock so that probes on one backend never contend with another.

use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::config::validation::is_valid_authority;
use crate::observability::metrics;

/// Error building a backend from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),

    #[error("invalid health check path {path:?} for backend {address}")]
    InvalidHealthPath { address: String, path: String },
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The `host:port` of the backend.
    address: String,
    /// Pre-calculated probe URL: `http://<address><health path>`.
    health_check_url: Url,
    /// Current health; starts unhealthy until the first successful probe.
    healthy: Mutex<bool>,
}

impl Backend {
    /// Create a new backend probed on `health_path`.
    pub fn new(address: impl Into<String>, health_path: &str) -> Result<Self, BackendError> {
        let address = address.into();
        if !is_valid_authority(&address) {
            return Err(BackendError::InvalidAddress(address));
        }

        let mut health_check_url = Url::parse(&format!("http://{address}"))
            .map_err(|_| BackendError::InvalidAddress(address.clone()))?;

        if !health_path.starts_with('/') {
            return Err(BackendError::InvalidHealthPath {
                address,
                path: health_path.to_string(),
            });
        }
        health_check_url.set_path(health_path);

        Ok(Self {
            address,
            health_check_url,
            healthy: Mutex::new(false),
        })
    }

    /// The `host:port` requests are forwarded to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The URL probed by the health checker.
    pub fn health_check_url(&self) -> &Url {
        &self.health_check_url
    }

    /// Return true if the last probe succeeded.
    pub fn is_healthy(&self) -> bool {
        *self.lock()
    }

    /// Record the outcome of a probe. Returns true if the state changed.
    ///
    /// Marking a backend unhealthy is logged on every call; marking it
    /// healthy is logged only when it recovers.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        let previous = {
            let mut guard = self.lock();
            std::mem::replace(&mut *guard, healthy)
        };

        if !healthy {
            tracing::warn!(backend = %self.address, "Backend unhealthy");
        } else if !previous {
            tracing::info!(backend = %self.address, "Backend healthy");
        }

        if previous != healthy {
            metrics::record_backend_health(&self.address, healthy);
        }

        previous != healthy
    }

    // A poisoned flag is still a valid bool; keep serving with it.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.healthy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
