//! Read-only admin endpoint.
//!
//! Served on its own listener so it never shadows proxied paths.

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::load_balancer::Pool;
use self::handlers::*;

pub fn router(pool: Arc<Pool>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/stats", get(get_stats))
        .with_state(pool)
}
