//! Periodic job scheduler.
//!
//! Drives the trending recalculation and the cleanup sweep on independent
//! intervals inside the host process. Jobs never overlap themselves: each
//! tick runs to completion before the next is considered.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use taxo_db::Database;

use crate::cleanup::{CleanupConfig, UnusedTagSweeper};
use crate::trending::{TrendingConfig, TrendingRecalculator};

/// Default seconds between trending recalculations.
pub const DEFAULT_TRENDING_INTERVAL_SECS: u64 = 3600;

/// Default seconds between cleanup sweeps.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 86_400;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between trending recalculations.
    pub trending_interval_secs: u64,
    /// Seconds between cleanup sweeps.
    pub cleanup_interval_secs: u64,
    /// Whether the scheduler runs at all.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trending_interval_secs: DEFAULT_TRENDING_INTERVAL_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            enabled: true,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TAXO_JOBS_ENABLED` | `true` | Enable/disable the scheduler |
    /// | `TRENDING_INTERVAL_SECS` | `3600` | Trending recompute cadence |
    /// | `CLEANUP_INTERVAL_SECS` | `86400` | Cleanup sweep cadence |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let enabled = std::env::var("TAXO_JOBS_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        Self {
            trending_interval_secs: std::env::var("TRENDING_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trending_interval_secs),
            cleanup_interval_secs: std::env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_secs),
            enabled,
        }
    }
}

/// Runs the periodic jobs until shutdown is signalled.
pub struct JobScheduler {
    trending: TrendingRecalculator,
    sweeper: UnusedTagSweeper,
    config: SchedulerConfig,
}

impl JobScheduler {
    /// Create a scheduler with configuration from the environment.
    pub fn new(db: Database) -> Self {
        Self {
            trending: TrendingRecalculator::with_config(db.clone(), TrendingConfig::from_env()),
            sweeper: UnusedTagSweeper::with_config(db, CleanupConfig::from_env()),
            config: SchedulerConfig::from_env(),
        }
    }

    /// Create a scheduler with explicit configuration.
    pub fn with_config(
        trending: TrendingRecalculator,
        sweeper: UnusedTagSweeper,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            trending,
            sweeper,
            config,
        }
    }

    /// Run until `shutdown` flips to `true`. Job failures are logged and
    /// the cadence continues; only shutdown stops the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.enabled {
            info!(
                subsystem = "jobs",
                component = "scheduler",
                "Job scheduler disabled by configuration"
            );
            return;
        }

        let mut trending_tick =
            interval(Duration::from_secs(self.config.trending_interval_secs.max(1)));
        trending_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cleanup_tick =
            interval(Duration::from_secs(self.config.cleanup_interval_secs.max(1)));
        cleanup_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            subsystem = "jobs",
            component = "scheduler",
            op = "start",
            trending_interval_secs = self.config.trending_interval_secs,
            cleanup_interval_secs = self.config.cleanup_interval_secs,
            "Job scheduler started"
        );

        loop {
            tokio::select! {
                _ = trending_tick.tick() => {
                    if let Err(err) = self.trending.run().await {
                        error!(
                            subsystem = "jobs",
                            component = "trending",
                            error = %err,
                            "Trending recalculation failed"
                        );
                    }
                }
                _ = cleanup_tick.tick() => {
                    if let Err(err) = self.sweeper.run().await {
                        error!(
                            subsystem = "jobs",
                            component = "cleanup",
                            error = %err,
                            "Cleanup sweep failed"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(
                            subsystem = "jobs",
                            component = "scheduler",
                            op = "stop",
                            "Job scheduler stopped"
                        );
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.trending_interval_secs, 3600);
        assert_eq!(config.cleanup_interval_secs, 86_400);
    }
}
