//! Passthrough strategy used when balancing is disabled.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Always picks the first configured backend, healthy or not.
///
/// Health checks keep running and logging, but never take the backend out
/// of service: with balancing disabled there is nowhere else to send traffic.
#[derive(Debug, Default)]
pub struct Passthrough;

impl Passthrough {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for Passthrough {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        backends.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_ignores_health() {
        let lb = Passthrough::new();
        let b1 = Arc::new(Backend::new("127.0.0.1:8080", "/health").unwrap());
        let b2 = Arc::new(Backend::new("127.0.0.1:8081", "/health").unwrap());
        b2.set_healthy(true);
        let backends = vec![b1, b2];

        for _ in 0..3 {
            assert_eq!(lb.next_server(&backends).unwrap().address(), "127.0.0.1:8080");
        }
        assert!(lb.next_server(&[]).is_none());
    }
}
