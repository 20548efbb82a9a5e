//! Unused-tag cleanup.
//!
//! Deletes tags that accumulated no usage, have no document links, and
//! were last touched before the configured threshold. Conservative by
//! design: any document link keeps the tag alive regardless of counters.

use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::info;

use taxo_core::defaults::CLEANUP_UNUSED_DAYS;
use taxo_core::{DocumentTagRepository, Result, TagRepository};
use taxo_db::Database;

/// Cleanup job configuration.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Days without use before a zero-usage tag is eligible.
    pub unused_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            unused_days: CLEANUP_UNUSED_DAYS,
        }
    }
}

impl CleanupConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CLEANUP_UNUSED_DAYS` | `180` | Inactivity threshold |
    pub fn from_env() -> Self {
        Self {
            unused_days: std::env::var("CLEANUP_UNUSED_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CLEANUP_UNUSED_DAYS),
        }
    }
}

/// Deletes long-unused, zero-usage tags.
pub struct UnusedTagSweeper {
    db: Database,
    config: CleanupConfig,
}

impl UnusedTagSweeper {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            config: CleanupConfig::default(),
        }
    }

    pub fn with_config(db: Database, config: CleanupConfig) -> Self {
        Self { db, config }
    }

    /// Run one sweep; returns how many tags were removed.
    pub async fn run(&self) -> Result<u64> {
        let start = Instant::now();
        let cutoff = Utc::now() - Duration::days(self.config.unused_days);
        let candidates = self.db.tags.unused_candidates(cutoff).await?;

        let mut removed = 0u64;
        for tag_id in candidates {
            // The counter says unused, but a document link overrides it.
            if self.db.documents.document_count_for_tag(tag_id).await? > 0 {
                continue;
            }
            self.db.tags.delete(tag_id).await?;
            removed += 1;
        }

        info!(
            subsystem = "jobs",
            component = "cleanup",
            op = "sweep",
            unused_days = self.config.unused_days,
            removed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Unused tags swept"
        );
        Ok(removed)
    }
}
