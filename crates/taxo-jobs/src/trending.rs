//! Trending score recalculation.
//!
//! Reads a consistent snapshot (one grouped window count plus the usage
//! snapshot), computes scores in memory, then writes everything back in a
//! single short transaction, so the scan never holds locks that would block
//! document tagging.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use taxo_core::defaults::{TRENDING_MIN_USAGE, TRENDING_TOP_FRACTION, TRENDING_WINDOW_DAYS};
use taxo_core::{Result, TagRepository, UsageHistoryRepository};
use taxo_db::Database;

/// Trending job configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `TRENDING_WINDOW_DAYS` | `7` | Rolling window length |
/// | `TRENDING_TOP_FRACTION` | `0.10` | Share of scored tags flagged trending |
/// | `TRENDING_MIN_USAGE` | `5` | Lifetime-usage floor for the flag |
#[derive(Debug, Clone)]
pub struct TrendingConfig {
    /// Rolling window length in days.
    pub window_days: i64,
    /// Fraction of eligible tags that receive the `is_trending` flag.
    pub top_fraction: f64,
    /// Minimum lifetime usage before a tag is eligible for the flag.
    /// The score itself is still recorded for ineligible tags.
    pub min_usage: i64,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: TRENDING_WINDOW_DAYS,
            top_fraction: TRENDING_TOP_FRACTION,
            min_usage: TRENDING_MIN_USAGE,
        }
    }
}

impl TrendingConfig {
    /// Create config from environment variables (with defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_days: std::env::var("TRENDING_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.window_days),
            top_fraction: std::env::var("TRENDING_TOP_FRACTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.top_fraction),
            min_usage: std::env::var("TRENDING_MIN_USAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_usage),
        }
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window_days = days;
        self
    }
}

/// Outcome of one recalculation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingStats {
    /// Tags whose score was written.
    pub scored: usize,
    /// Tags flagged trending.
    pub flagged: usize,
}

/// Window-count score for one tag: recent uses normalized against the
/// tag's lifetime usage and the window length. Zero recent uses score 0
/// regardless of lifetime.
pub fn trending_score(recent: i64, lifetime: i64, window_days: i64) -> f64 {
    if recent <= 0 {
        return 0.0;
    }
    recent as f64 / (lifetime.max(1) as f64 * window_days.max(1) as f64)
}

/// Pick the tags that get the trending flag: score descending (ties by id
/// for reproducibility), top `top_fraction` of eligible tags, where
/// eligibility requires a positive score and `min_usage` lifetime uses.
fn select_trending(
    scores: &[(Uuid, f64)],
    lifetimes: &HashMap<Uuid, i64>,
    top_fraction: f64,
    min_usage: i64,
) -> Vec<Uuid> {
    let mut eligible: Vec<(Uuid, f64)> = scores
        .iter()
        .filter(|(id, score)| {
            *score > 0.0 && lifetimes.get(id).copied().unwrap_or(0) >= min_usage
        })
        .copied()
        .collect();
    if eligible.is_empty() {
        return Vec::new();
    }

    eligible.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let take = ((eligible.len() as f64) * top_fraction).ceil().max(1.0) as usize;
    eligible.truncate(take);
    eligible.into_iter().map(|(id, _)| id).collect()
}

/// Recomputes `trending_score` and the `is_trending` flag set.
pub struct TrendingRecalculator {
    db: Database,
    config: TrendingConfig,
}

impl TrendingRecalculator {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            config: TrendingConfig::default(),
        }
    }

    pub fn with_config(db: Database, config: TrendingConfig) -> Self {
        Self { db, config }
    }

    /// Run one recalculation pass.
    pub async fn run(&self) -> Result<TrendingStats> {
        let start = Instant::now();
        let since = Utc::now() - Duration::days(self.config.window_days);

        let window: HashMap<Uuid, i64> =
            self.db.history.window_counts(since).await?.into_iter().collect();
        let usage = self.db.tags.usage_snapshot().await?;
        let lifetimes: HashMap<Uuid, i64> = usage.iter().copied().collect();

        let scores: Vec<(Uuid, f64)> = usage
            .iter()
            .map(|(id, lifetime)| {
                let recent = window.get(id).copied().unwrap_or(0);
                (*id, trending_score(recent, *lifetime, self.config.window_days))
            })
            .collect();

        let flagged = select_trending(
            &scores,
            &lifetimes,
            self.config.top_fraction,
            self.config.min_usage,
        );

        self.db.tags.apply_trending(&scores, &flagged).await?;

        let stats = TrendingStats {
            scored: scores.len(),
            flagged: flagged.len(),
        };
        info!(
            subsystem = "jobs",
            component = "trending",
            op = "recompute",
            window_days = self.config.window_days,
            scored = stats.scored,
            flagged = stats.flagged,
            duration_ms = start.elapsed().as_millis() as u64,
            "Trending scores recomputed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_score_zero_without_recent_use() {
        assert_eq!(trending_score(0, 100, 7), 0.0);
    }

    #[test]
    fn test_trending_score_normalizes_by_lifetime_and_window() {
        let score = trending_score(7, 10, 7);
        assert!((score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_trending_score_spike_on_new_tag() {
        // A freshly created tag with a burst: lifetime clamps to 1.
        let new_tag = trending_score(5, 0, 7);
        let old_tag = trending_score(5, 100, 7);
        assert!(new_tag > old_tag);
    }

    #[test]
    fn test_select_trending_respects_usage_floor() {
        let hot = Uuid::new_v4();
        let spike = Uuid::new_v4();
        let scores = vec![(hot, 0.5), (spike, 0.9)];
        let lifetimes: HashMap<Uuid, i64> = [(hot, 50), (spike, 1)].into_iter().collect();

        let flagged = select_trending(&scores, &lifetimes, 1.0, 5);
        assert_eq!(flagged, vec![hot]);
    }

    #[test]
    fn test_select_trending_takes_top_fraction() {
        let mut scores = Vec::new();
        let mut lifetimes = HashMap::new();
        for i in 0..20 {
            let id = Uuid::new_v4();
            scores.push((id, (i + 1) as f64 / 100.0));
            lifetimes.insert(id, 10);
        }
        let flagged = select_trending(&scores, &lifetimes, 0.10, 5);
        assert_eq!(flagged.len(), 2);

        let best = scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap()
            .0;
        assert!(flagged.contains(&best));
    }

    #[test]
    fn test_select_trending_empty_without_activity() {
        let scores = vec![(Uuid::new_v4(), 0.0)];
        let lifetimes: HashMap<Uuid, i64> = HashMap::new();
        assert!(select_trending(&scores, &lifetimes, 0.10, 5).is_empty());
    }
}
