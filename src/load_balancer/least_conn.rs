//! Fewest connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Server, Algorithm, LoadBalancer};

/// Fewest connections selector.
/// Selects the live backend with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn algorithm(&self) -> Algorithm {
        Algorithm::FewestConnections
    }

    fn next_server(&self, backends: &[Arc<dyn Server>]) -> Option<Arc<dyn Server>> {
        // In case of tie, the first one is selected (stability)
        backends
            .iter()
            .filter(|b| b.is_alive())
            .min_by_key(|b| b.active_connections())
            .cloned()
    }
}
