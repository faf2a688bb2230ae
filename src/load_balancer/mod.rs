//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the dispatcher
//!     → pool.rs (fixed, ordered set of backends)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through healthy backends)
//!         - passthrough.rs (balancing disabled: first backend)
//!     → backend.rs (selected backend, or none)
//! ```
//!
//! # Design Decisions
//! - Strategy owns its rotation state; the pool owns the backends
//! - Unhealthy backends excluded from round-robin selection
//! - Selection never performs I/O

use std::sync::Arc;

pub mod backend;
pub mod passthrough;
pub mod pool;
pub mod round_robin;

pub use backend::{Backend, BackendError};
pub use pool::{BackendPool, PoolError};

/// A backend selection algorithm.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the backend for the next request, or `None` if none is eligible.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}
