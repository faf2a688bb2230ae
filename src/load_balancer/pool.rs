//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered, fixed set of backends built from configuration
//! - Apply the configured load balancing algorithm to select a backend
//! - Expose the backends to the health checkers

use std::sync::Arc;

use crate::config::{BalanceMode, BalancerConfig};
use crate::load_balancer::{
    backend::{Backend, BackendError},
    passthrough::Passthrough,
    round_robin::RoundRobin,
    LoadBalancer,
};

/// Error building a backend pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("empty proxy pool")]
    Empty,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The ordered set of backends plus the algorithm choosing among them.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Create a pool over `backends`, which must not be empty.
    pub fn new(backends: Vec<Arc<Backend>>, mode: BalanceMode) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }

        let balancer: Box<dyn LoadBalancer> = match mode {
            BalanceMode::RoundRobin => Box::new(RoundRobin::new()),
            BalanceMode::Disable => Box::new(Passthrough::new()),
        };

        Ok(Self { backends, balancer })
    }

    /// Create a pool with one backend per configured host, in order.
    pub fn from_config(config: &BalancerConfig) -> Result<Self, PoolError> {
        let backends = config
            .hosts
            .iter()
            .map(|host| Backend::new(host.as_str(), &config.health_check.path).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            backends = backends.len(),
            balance = %config.balance,
            "Backend pool created"
        );

        Self::new(backends, config.balance)
    }

    /// Select the backend for the next request.
    pub fn select(&self) -> Option<Arc<Backend>> {
        let selected = self.balancer.next_server(&self.backends);
        if selected.is_none() {
            tracing::debug!(backend_count = self.backends.len(), "No healthy backends found in pool");
            for b in &self.backends {
                tracing::trace!(backend = %b.address(), healthy = b.is_healthy(), "Backend status");
            }
        }
        selected
    }

    /// All backends, in configuration order (for health checking).
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Return true if the pool has no backends.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
