//! Least latency load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Server, Algorithm, LoadBalancer};

/// Selects the live backend with the lowest average latency.
#[derive(Debug, Default)]
pub struct LeastLatency;

impl LoadBalancer for LeastLatency {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LeastLatency
    }

    fn next_server(&self, backends: &[Arc<dyn Server>]) -> Option<Arc<dyn Server>> {
        // min_by_key keeps the first of equal keys, so ties go to registration order.
        backends
            .iter()
            .filter(|b| b.is_alive())
            .min_by_key(|b| b.average_latency())
            .cloned()
    }
}
