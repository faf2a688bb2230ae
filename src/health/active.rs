//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe one backend
//! - Update that backend's health state based on results
//! - Stop promptly when shutdown is signalled

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::health::probe::{HttpProbe, Probe, ProbeOutcome};
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::Backend;

/// Health checker for a single backend.
///
/// Every backend gets its own checker task, so a slow or dead backend only
/// delays its own probes.
pub struct HealthChecker<P = HttpProbe> {
    backend: Arc<Backend>,
    probe: P,
    interval: Duration,
}

impl<P: Probe> HealthChecker<P> {
    pub fn new(backend: Arc<Backend>, probe: P, interval: Duration) -> Self {
        Self {
            backend,
            probe,
            interval,
        }
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Probe once and record the outcome on the backend.
    pub async fn check(&self) -> ProbeOutcome {
        let outcome = self.probe.probe(self.backend.health_check_url()).await;
        self.record(&outcome);
        outcome
    }

    fn record(&self, outcome: &ProbeOutcome) {
        if outcome.is_healthy() {
            if !self.backend.is_healthy() {
                self.backend.set_healthy(true);
            }
            return;
        }

        tracing::debug!(
            backend = %self.backend.address(),
            url = %self.backend.health_check_url(),
            reason = %outcome,
            "Health check failed"
        );
        self.backend.set_healthy(false);
    }

    /// Probe on every tick until shutdown.
    ///
    /// The first probe runs one `interval` after start. After each probe the
    /// timer is reset, so `interval` separates the end of one probe from the
    /// start of the next.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            backend = %self.backend.address(),
            interval = ?self.interval,
            "Health checker starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                _ = self.check() => {}
                _ = shutdown.recv() => break,
            }

            ticker.reset();
        }

        tracing::info!(backend = %self.backend.address(), "Health checker stopped");
    }
}
