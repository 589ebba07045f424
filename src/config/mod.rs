//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and/or CLI flags
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides applied in main
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → lifecycle::startup builds the pool from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend set is fixed for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    AdminConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RetryConfig,
    StatsConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
