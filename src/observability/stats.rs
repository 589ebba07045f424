//! Periodic backend stats reporting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::StatsConfig;
use crate::load_balancer::Pool;

pub struct StatsReporter {
    pool: Arc<Pool>,
    config: StatsConfig,
}

impl StatsReporter {
    pub fn new(pool: Arc<Pool>, config: StatsConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Stats reporting disabled");
            return;
        }
        if self.config.interval_secs == 0 {
            tracing::warn!("Stats interval is zero, reporting disabled");
            return;
        }

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.pool.report_stats();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Stats reporter stopping");
                    break;
                }
            }
        }
    }
}
