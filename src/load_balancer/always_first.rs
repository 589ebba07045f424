//! Always-first strategy.
//!
//! Baseline policy: every request goes to the first registered backend,
//! alive or not.

use std::sync::Arc;

use crate::load_balancer::{backend::Server, Algorithm, LoadBalancer};

#[derive(Debug, Default)]
pub struct AlwaysFirst;

impl LoadBalancer for AlwaysFirst {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AlwaysFirst
    }

    fn next_server(&self, backends: &[Arc<dyn Server>]) -> Option<Arc<dyn Server>> {
        backends.first().cloned()
    }
}
