use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::load_balancer::{BackendStats, Pool};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub algorithm: String,
    pub backends: usize,
    pub alive: usize,
}

pub async fn get_status(State(pool): State<Arc<Pool>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        algorithm: pool.algorithm().to_string(),
        backends: pool.backends().len(),
        alive: pool.backends().iter().filter(|b| b.is_alive()).count(),
    })
}

pub async fn get_stats(State(pool): State<Arc<Pool>>) -> Json<Vec<BackendStats>> {
    Json(pool.backends().iter().map(|b| b.stats()).collect())
}
