//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → transport enforces connect/request timeouts
//!     → On transport error: retries.rs (same backend, fixed delay, bounded)
//!     → Retries exhausted: pool marks backend dead and fails over
//!     → Attempt cap reached: one terminal error to the caller
//! ```
//!
//! # Design Decisions
//! - Any HTTP status from a backend is a response, not a failure
//! - Every request carries its own attempt context; nothing is shared
//! - Failover is bounded so flapping backends cannot loop a request forever

pub mod retries;
