//! Retry logic.
//!
//! # Responsibilities
//! - Carry per-request retry and attempt counts
//! - Retry a failing backend a bounded number of times with a fixed delay
//! - Hand the final error back so the pool can fail over
//!
//! # Design Decisions
//! - Only transport errors are retried; any HTTP status is a final answer
//! - Retries never touch pool state; failover is the pool's job
//! - The retry count restarts on every new backend

use axum::body::Body;
use axum::http::Response;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::load_balancer::backend::Server;
use crate::observability::metrics;
use crate::proxy::{ProxyRequest, TransportError};

/// Bounds for the retry and failover chain of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Same-backend retries after the first failed attempt.
    pub max_retries: u32,
    /// Pause before each same-backend retry.
    pub retry_delay: Duration,
    /// Distinct backends one request may be routed to.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            max_attempts: 3,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

/// Retry bookkeeping for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptContext {
    retries: u32,
    attempts: u32,
}

impl AttemptContext {
    pub fn new() -> Self {
        Self {
            retries: 0,
            attempts: 1,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Context for one more try against the same backend.
    pub fn retried(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }

    /// Context for routing to a different backend.
    pub fn failed_over(self) -> Self {
        Self {
            // Deliberate: each backend gets its own full retry budget.
            retries: 0,
            attempts: self.attempts + 1,
        }
    }
}

impl Default for AttemptContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward `request` to `server`, retrying transport errors up to
/// `policy.max_retries` times. Returns the last error once retries run out.
pub async fn forward_with_retries(
    server: &dyn Server,
    request: &ProxyRequest,
    policy: &RetryPolicy,
    ctx: &mut AttemptContext,
) -> Result<Response<Body>, TransportError> {
    loop {
        let err = match server.forward(request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        tracing::warn!(
            backend = %server.address(),
            attempt = ctx.attempts(),
            retry = ctx.retries(),
            error = %err,
            "Upstream error"
        );

        if ctx.retries() >= policy.max_retries {
            return Err(err);
        }

        tokio::time::sleep(policy.retry_delay).await;
        *ctx = ctx.retried();
        metrics::record_retry(server.address());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::testing::{scripted_backend, Outcome};
    use axum::http::Method;
    use std::sync::atomic::Ordering;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            retry_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn context_transitions() {
        let ctx = AttemptContext::new();
        assert_eq!((ctx.retries(), ctx.attempts()), (0, 1));

        let ctx = ctx.retried().retried();
        assert_eq!((ctx.retries(), ctx.attempts()), (2, 1));

        let ctx = ctx.failed_over();
        assert_eq!((ctx.retries(), ctx.attempts()), (0, 2));
    }

    #[tokio::test]
    async fn always_failing_backend_gets_max_retries_plus_one_calls() {
        let (server, calls) = scripted_backend("10.0.0.1:80", Outcome::Fail);
        let request = ProxyRequest::new(Method::GET, "/".parse().unwrap());
        let mut ctx = AttemptContext::new();

        let result = forward_with_retries(server.as_ref(), &request, &fast_policy(), &mut ctx).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(ctx.retries(), 3);
        assert_eq!(ctx.attempts(), 1);
        // Retrying alone never marks the backend dead.
        assert!(server.is_alive());
        assert_eq!(server.active_connections(), 0);
    }

    #[tokio::test]
    async fn success_stops_retrying() {
        let (server, calls) = scripted_backend("10.0.0.1:80", Outcome::Alternate(Duration::ZERO));
        let request = ProxyRequest::new(Method::GET, "/".parse().unwrap());
        let mut ctx = AttemptContext::new();

        // Call 0 succeeds outright.
        forward_with_retries(server.as_ref(), &request, &fast_policy(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Call 1 fails, call 2 succeeds on the first retry.
        let mut ctx = AttemptContext::new();
        forward_with_retries(server.as_ref(), &request, &fast_policy(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.retries(), 1);
    }

    #[test]
    fn policy_from_config() {
        let config = RetryConfig {
            max_retries: 5,
            retry_delay_ms: 25,
            max_attempts: 2,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.retry_delay, Duration::from_millis(25));
        assert_eq!(policy.max_attempts, 2);
    }
}
