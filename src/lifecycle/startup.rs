//! Startup orchestration.
//!
//! # Responsibilities
//! - Build backends and the pool from validated configuration
//! - Register every backend before the pool is shared
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The pool is built once and handed out as `Arc<Pool>`

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::load_balancer::{Backend, Pool, PoolError};
use crate::proxy::TransportError;
use crate::resilience::retries::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("backend {address}: {source}")]
    Backend {
        address: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Build the pool described by `config`.
pub fn build_pool(config: &ProxyConfig) -> Result<Pool, StartupError> {
    let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);
    let request_timeout = Duration::from_secs(config.timeouts.request_secs);

    let mut pool = Pool::new(config.algorithm, RetryPolicy::from(&config.retries));
    for address in &config.backends {
        let backend = Backend::new(address.as_str(), connect_timeout, request_timeout).map_err(
            |source| StartupError::Backend {
                address: address.clone(),
                source,
            },
        )?;
        pool.add_backend(Arc::new(backend))?;
    }

    tracing::info!(
        algorithm = %pool.algorithm(),
        backends = pool.backends().len(),
        "Backend pool ready"
    );
    Ok(pool)
}
