//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → dispatcher.rs (ask the pool for a backend)
//!         - none: 502 "empty proxy pool"
//!         - some: forward.rs (rewrite URI, proxy to backend)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod forward;
pub mod server;

pub use dispatcher::{empty_pool_response, Dispatcher, EMPTY_POOL_BODY};
pub use forward::{ForwardError, Forwarder, HttpForwarder};
pub use server::{HttpServer, ServerError};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";
