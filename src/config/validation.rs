//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//! - Reject duplicate backends
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use axum::http::uri::Authority;
use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,

    #[error("backend address '{0}' is not a valid host:port")]
    InvalidBackend(String),

    #[error("backend address '{0}' is listed more than once")]
    DuplicateBackend(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for address in &config.backends {
        if !is_host_port(address) {
            errors.push(ValidationError::InvalidBackend(address.clone()));
        } else if !seen.insert(address.as_str()) {
            errors.push(ValidationError::DuplicateBackend(address.clone()));
        }
    }

    check_bind(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_bind(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_bind(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let non_zero = [
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("stats.interval_secs", config.stats.interval_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("retries.max_attempts", u64::from(config.retries.max_attempts)),
        ("listener.max_body_bytes", config.listener.max_body_bytes as u64),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with an explicit, non-zero port.
fn is_host_port(address: &str) -> bool {
    match address.parse::<Authority>() {
        Ok(authority) => {
            !authority.host().is_empty()
                && authority.port_u16().is_some_and(|p| p != 0)
                && !address.contains('@')
        }
        Err(_) => false,
    }
}

fn check_bind(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        ProxyConfig {
            backends: vec!["127.0.0.1:3000".into(), "localhost:3001".into()],
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = valid();
        config.backends = vec![
            "127.0.0.1:3000".into(),
            "127.0.0.1:3000".into(),
            "no-port".into(),
            "http://x:1".into(),
        ];
        config.listener.bind_address = "nope".into();
        config.health_check.interval_secs = 0;
        config.retries.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateBackend("127.0.0.1:3000".into()),
                ValidationError::InvalidBackend("no-port".into()),
                ValidationError::InvalidBackend("http://x:1".into()),
                ValidationError::InvalidBindAddress {
                    field: "listener.bind_address",
                    value: "nope".into(),
                },
                ValidationError::Zero("health_check.interval_secs"),
                ValidationError::Zero("retries.max_attempts"),
            ]
        );
    }

    #[test]
    fn requires_a_backend() {
        let config = ProxyConfig::default();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoBackends]));
    }

    #[test]
    fn admin_address_checked_only_when_enabled() {
        let mut config = valid();
        config.admin.bind_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.admin.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
