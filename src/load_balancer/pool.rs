//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered set of backends and the active selection algorithm
//! - Dispatch requests, failing over when a backend exhausts its retries
//! - Sweep backend liveness with TCP probes
//! - Report per-backend stats

use axum::body::Body;
use axum::http::Response;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::health::probe;
use crate::load_balancer::{
    backend::{BackendStats, Server},
    Algorithm, LoadBalancer,
};
use crate::observability::metrics;
use crate::proxy::{ProxyRequest, TransportError};
use crate::resilience::retries::{forward_with_retries, AttemptContext, RetryPolicy};

/// Errors from pool bookkeeping and selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no healthy backends available")]
    NoHealthyBackends,

    #[error("backend {0} not found in pool")]
    BackendNotFound(String),

    #[error("backend {0} is already registered")]
    DuplicateBackend(String),
}

/// Terminal failure of a dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("request failed after {attempts} backend attempts: {source}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

/// Which backends a health sweep probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepScope {
    /// Every backend, so dead ones can come back.
    #[default]
    All,
    /// Only backends currently marked alive.
    AliveOnly,
}

/// Outcome of one health sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub probed: usize,
    pub went_down: usize,
    pub recovered: usize,
}

/// The registry of backends plus the selection policy.
#[derive(Debug)]
pub struct Pool {
    backends: Vec<Arc<dyn Server>>,
    balancer: Box<dyn LoadBalancer>,
    retry_policy: RetryPolicy,
}

impl Pool {
    /// Create an empty pool using `algorithm`.
    pub fn new(algorithm: Algorithm, retry_policy: RetryPolicy) -> Self {
        Self::with_balancer(algorithm.balancer(), retry_policy)
    }

    /// Create an empty pool around a specific selector instance.
    pub fn with_balancer(balancer: Box<dyn LoadBalancer>, retry_policy: RetryPolicy) -> Self {
        Self {
            backends: Vec::new(),
            balancer,
            retry_policy,
        }
    }

    /// Register a backend. Only possible before the pool is shared.
    pub fn add_backend(&mut self, server: Arc<dyn Server>) -> Result<(), PoolError> {
        if self.backends.iter().any(|b| b.address() == server.address()) {
            return Err(PoolError::DuplicateBackend(server.address().to_string()));
        }
        tracing::debug!(backend = %server.address(), position = self.backends.len(), "Backend registered");
        self.backends.push(server);
        Ok(())
    }

    pub fn algorithm(&self) -> Algorithm {
        self.balancer.algorithm()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// All backends in registration order.
    pub fn backends(&self) -> &[Arc<dyn Server>] {
        &self.backends
    }

    /// Pick the next backend per the active algorithm.
    pub fn select_backend(&self) -> Result<Arc<dyn Server>, PoolError> {
        match self.balancer.next_server(&self.backends) {
            Some(server) => Ok(server),
            None => {
                tracing::debug!(
                    algorithm = %self.algorithm(),
                    backend_count = self.backends.len(),
                    "No healthy backends found"
                );
                Err(PoolError::NoHealthyBackends)
            }
        }
    }

    pub fn get_backend_by_address(&self, address: &str) -> Result<Arc<dyn Server>, PoolError> {
        self.backends
            .iter()
            .find(|b| b.address() == address)
            .cloned()
            .ok_or_else(|| PoolError::BackendNotFound(address.to_string()))
    }

    /// Route one request, retrying and failing over until a backend answers,
    /// the pool runs dry or the attempt cap is hit.
    pub async fn dispatch(&self, request: &ProxyRequest) -> Result<Response<Body>, DispatchError> {
        let mut ctx = AttemptContext::new();

        loop {
            let server = self.select_backend()?;
            tracing::debug!(backend = %server.address(), attempt = ctx.attempts(), "Forwarding request");

            let err =
                match forward_with_retries(server.as_ref(), request, &self.retry_policy, &mut ctx).await {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

            self.mark_dead(server.address());

            if ctx.attempts() >= self.retry_policy.max_attempts {
                tracing::error!(
                    attempts = ctx.attempts(),
                    error = %err,
                    "Giving up on request"
                );
                return Err(DispatchError::AttemptsExhausted {
                    attempts: ctx.attempts(),
                    source: err,
                });
            }

            ctx = ctx.failed_over();
            metrics::record_failover(server.address());
            tracing::info!(
                from = %server.address(),
                attempt = ctx.attempts(),
                "Failing over to another backend"
            );
        }
    }

    /// Mark a backend dead by address. A miss is logged and ignored.
    fn mark_dead(&self, address: &str) {
        match self.get_backend_by_address(address) {
            Ok(server) => {
                if server.is_alive() {
                    tracing::warn!(backend = %address, "Retries exhausted, marking backend dead");
                }
                server.set_alive(false);
                metrics::record_backend_health(address, false);
            }
            Err(err) => {
                tracing::warn!(backend = %address, error = %err, "Could not mark backend dead");
            }
        }
    }

    /// Probe backends with a TCP connect and update liveness.
    /// Probes in one sweep run concurrently, each bounded by `timeout`.
    pub async fn health_check_sweep(&self, timeout: Duration, scope: SweepScope) -> SweepReport {
        let targets: Vec<Arc<dyn Server>> = self
            .backends
            .iter()
            .filter(|b| scope == SweepScope::All || b.is_alive())
            .cloned()
            .collect();

        let results = join_all(
            targets
                .iter()
                .map(|b| probe::is_reachable(b.address(), timeout)),
        )
        .await;

        let mut report = SweepReport {
            probed: targets.len(),
            ..SweepReport::default()
        };

        for (server, reachable) in targets.iter().zip(results) {
            let was_alive = server.is_alive();
            server.set_alive(reachable);

            if was_alive && !reachable {
                report.went_down += 1;
                tracing::warn!(backend = %server.address(), "Backend is down");
            } else if !was_alive && reachable {
                report.recovered += 1;
                tracing::info!(backend = %server.address(), "Backend recovered");
            }

            metrics::record_backend_health(server.address(), reachable);
        }

        report
    }

    /// Snapshot every backend and log it.
    pub fn report_stats(&self) -> Vec<BackendStats> {
        let stats: Vec<BackendStats> = self.backends.iter().map(|b| b.stats()).collect();
        for s in &stats {
            tracing::info!(
                backend = %s.address,
                alive = s.alive,
                active = s.active_connections,
                total = s.total_requests,
                latency_ms = s.average_latency_ms,
                "Backend stats"
            );
        }
        stats
    }
}
