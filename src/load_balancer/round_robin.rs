//! Round-robin load balancing strategy.

use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector.
///
/// Holds the rotation cursor behind its own lock, separate from the
/// per-backend health locks. The cursor is advanced once per candidate
/// examined, whether or not the candidate is chosen, so concurrent callers
/// interleave their rotations: ordering is approximate, fairness is not.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rotation position.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the index under the cursor and advance it by one (mod `len`).
    fn advance(&self, len: usize) -> usize {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if *cursor >= len {
            *cursor = 0;
        }
        let index = *cursor;
        *cursor = (index + 1) % len;
        index
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();

        // Scan one position past a full rotation; concurrent callers move
        // the cursor underneath us, so `len` steps may not cover every backend.
        for _ in 0..=len {
            let backend = &backends[self.advance(len)];
            if backend.is_healthy() {
                return Some(backend.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn backends(n: usize) -> Vec<Arc<Backend>> {
        (0..n)
            .map(|i| {
                let b = Backend::new(format!("127.0.0.1:{}", 8080 + i), "/health").unwrap();
                b.set_healthy(true);
                Arc::new(b)
            })
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = backends(3);

        let picked: Vec<_> = (0..3)
            .map(|_| lb.next_server(&backends).unwrap().address().to_string())
            .collect();
        assert_eq!(picked, vec!["127.0.0.1:8080", "127.0.0.1:8081", "127.0.0.1:8082"]);
        assert_eq!(lb.cursor(), 0);

        let s4 = lb.next_server(&backends).unwrap();
        assert_eq!(s4.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_window_covers_every_backend() {
        let lb = RoundRobin::new();
        let backends = backends(5);

        // Start from an arbitrary position.
        lb.next_server(&backends);
        lb.next_server(&backends);

        let window: HashSet<_> = (0..5)
            .map(|_| lb.next_server(&backends).unwrap().address().to_string())
            .collect();
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_skips_unhealthy() {
        let lb = RoundRobin::new();
        let backends = backends(2);
        backends[1].set_healthy(false);

        for _ in 0..10 {
            let s = lb.next_server(&backends).unwrap();
            assert_eq!(s.address(), "127.0.0.1:8080");
        }
    }

    #[test]
    fn test_recovered_backend_selected_again() {
        let lb = RoundRobin::new();
        let backends = backends(2);
        backends[1].set_healthy(false);

        assert_eq!(lb.next_server(&backends).unwrap().address(), "127.0.0.1:8080");
        backends[1].set_healthy(true);
        assert_eq!(lb.next_server(&backends).unwrap().address(), "127.0.0.1:8081");
    }

    #[test]
    fn test_all_unhealthy() {
        let lb = RoundRobin::new();
        let backends = backends(3);
        for b in &backends {
            b.set_healthy(false);
        }

        assert!(lb.next_server(&backends).is_none());
        assert!(lb.cursor() < backends.len());
    }

    #[test]
    fn test_empty() {
        let lb = RoundRobin::new();
        assert!(lb.next_server(&[]).is_none());
    }

    #[test]
    fn test_concurrent_selection_stays_in_bounds() {
        let lb = Arc::new(RoundRobin::new());
        let backends = Arc::new(backends(4));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lb = lb.clone();
                let backends = backends.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert!(lb.next_server(&backends).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(lb.cursor() < 4);
    }
}
