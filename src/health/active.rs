//! Active health checking.
//!
//! # Responsibilities
//! - Periodically sweep the pool
//! - Stop when the process-wide shutdown fires

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::{Pool, SweepScope};

pub struct HealthMonitor {
    pool: Arc<Pool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<Pool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    fn scope(&self) -> SweepScope {
        if self.config.recover_dead {
            SweepScope::All
        } else {
            SweepScope::AliveOnly
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }
        if self.config.interval_secs == 0 {
            tracing::warn!("Health check interval is zero, active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            recover_dead = self.config.recover_dead,
            "Health monitor starting"
        );

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; backends start out alive anyway.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.pool.health_check_sweep(timeout, self.scope()).await;
                    tracing::debug!(
                        probed = report.probed,
                        went_down = report.went_down,
                        recovered = report.recovered,
                        "Health sweep complete"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
