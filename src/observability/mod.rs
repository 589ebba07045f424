//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool, retry layer, health monitor
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → stats.rs (periodic per-backend snapshot)
//! ```

pub mod logging;
pub mod metrics;
pub mod stats;
