//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs), one task per backend:
//!     Periodic timer
//!     → probe.rs (GET <backend><path>, bounded by the probe timeout)
//!     → Backend::set_healthy
//! ```
//!
//! # Design Decisions
//! - Exactly 200 OK is healthy; anything else, errors and timeouts are not
//! - No thresholds: one failed probe takes a backend out until the next 200
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod probe;

pub use active::HealthChecker;
pub use probe::{HttpProbe, Probe, ProbeOutcome};
