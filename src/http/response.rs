//! Response handling.
//!
//! # Responsibilities
//! - Map terminal dispatch failures to HTTP status codes
//!
//! # Design Decisions
//! - An exhausted pool is 503: nothing can make progress
//! - A request that burned through its attempts is 502
//! - Callers never see partial upstream responses; only one terminal error

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::{DispatchError, PoolError};

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Pool(PoolError::NoHealthyBackends) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::AttemptsExhausted { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = match self.status_code() {
            StatusCode::SERVICE_UNAVAILABLE => "No healthy backends",
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            _ => "Internal error",
        };
        (self.status_code(), body).into_response()
    }
}
