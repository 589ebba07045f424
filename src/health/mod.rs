//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Pool::health_check_sweep
//!     → probe.rs (TCP connect with timeout, per backend, concurrently)
//!     → Backend liveness flipped
//!
//! Failure escalation (resilience/retries.rs + pool.rs):
//!     Retries exhausted on a request
//!     → Backend marked dead immediately
//! ```
//!
//! # Design Decisions
//! - Liveness is a single atomic flag per backend; last writer wins
//! - A sweep probes dead backends too, so they can recover
//! - One slow probe never delays the others in the same sweep

pub mod active;
pub mod probe;
