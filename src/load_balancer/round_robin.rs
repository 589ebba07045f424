//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Server, Algorithm, LoadBalancer};

/// Round-robin selector.
/// Stores the shared cursor used to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the rotation from a given cursor value.
    /// The first selection lands on `cursor + 1`.
    pub fn starting_at(cursor: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(cursor),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl LoadBalancer for RoundRobin {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RoundRobin
    }

    fn next_server(&self, backends: &[Arc<dyn Server>]) -> Option<Arc<dyn Server>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();
        // Every caller gets a distinct starting point.
        let next = self.cursor.fetch_add(1, Ordering::SeqCst).wrapping_add(1) % len;

        for offset in 0..len {
            let index = (next + offset) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                if offset != 0 {
                    // Skip ahead so the next caller continues after this one.
                    self.cursor.store(index, Ordering::SeqCst);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}
