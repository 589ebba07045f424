//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (dispatch)
//!     → Apply load balancing algorithm:
//!         - always_first.rs (baseline: backend zero)
//!         - round_robin.rs (rotate through live backends)
//!         - least_latency.rs (lowest average latency)
//!         - least_conn.rs (fewest active connections)
//!     → backend.rs (forward through the backend's transport)
//!     → On transport error: retry, then mark dead and fail over
//! ```
//!
//! # Design Decisions
//! - Selectors are stateless except round robin's shared cursor
//! - Dead backends are excluded from selection (except always-first)
//! - Backends are registered once at startup; the pool is then shared read-only

use std::fmt;
use std::sync::Arc;

pub mod algorithm;
pub mod always_first;
pub mod backend;
pub mod least_conn;
pub mod least_latency;
pub mod pool;
pub mod round_robin;

#[cfg(test)]
pub(crate) mod testing;

pub use algorithm::Algorithm;
pub use backend::{Backend, BackendStats, Server};
pub use pool::{DispatchError, Pool, PoolError, SweepReport, SweepScope};

/// A backend selection policy.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    fn algorithm(&self) -> Algorithm;

    /// Pick a backend, or `None` when no candidate qualifies.
    fn next_server(&self, backends: &[Arc<dyn Server>]) -> Option<Arc<dyn Server>>;
}
