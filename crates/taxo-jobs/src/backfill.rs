//! Taxonomy backfill.
//!
//! Rebuilds derived state (usage counters, heuristic categories, the
//! cooccurrence matrix, and optionally missing history rows) from the
//! document↔tag links. Run once when adopting the engine over an
//! existing corpus, or after a bulk import.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use taxo_core::lexicon::categorize;
use taxo_core::{Result, TagRepository};
use taxo_db::Database;

/// Backfill configuration.
#[derive(Debug, Clone, Default)]
pub struct BackfillConfig {
    /// Rebuild the cooccurrence matrix from scratch.
    pub rebuild_cooccurrence: bool,
    /// Insert history rows for links that have none, stamped with the
    /// link's tagging time.
    pub rebuild_history: bool,
}

/// Outcome of one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub tags_updated: usize,
    pub documents_processed: usize,
    pub history_rows_created: usize,
}

/// Rebuilds derived tag state from document links.
pub struct TaxonomyBackfill {
    db: Database,
    config: BackfillConfig,
}

impl TaxonomyBackfill {
    pub fn new(db: Database, config: BackfillConfig) -> Self {
        Self { db, config }
    }

    /// Run one backfill pass.
    pub async fn run(&self) -> Result<BackfillStats> {
        let start = Instant::now();
        let links = self.db.documents.all_links_with_time().await?;

        // BTreeMaps keep the write order reproducible.
        let mut per_tag: BTreeMap<Uuid, i64> = BTreeMap::new();
        let mut per_document: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for (document_id, tag_id, _) in &links {
            *per_tag.entry(*tag_id).or_insert(0) += 1;
            per_document.entry(*document_id).or_default().push(*tag_id);
        }

        let mut stats = BackfillStats::default();

        for (tag_id, count) in &per_tag {
            self.db.tags.set_usage_count(*tag_id, *count).await?;
            if let Some(tag) = self.db.tags.get(*tag_id).await? {
                self.db
                    .tags
                    .set_category(*tag_id, categorize(&tag.name))
                    .await?;
            }
            stats.tags_updated += 1;
        }

        if self.config.rebuild_cooccurrence {
            self.db.cooccurrence.clear_all().await?;
            for tag_ids in per_document.values() {
                if tag_ids.len() >= 2 {
                    self.db.cooccurrence.update_from_document_tags(tag_ids).await?;
                }
                stats.documents_processed += 1;
            }
        }

        if self.config.rebuild_history {
            for (document_id, tag_id, tagged_at) in &links {
                if self.db.history.exists(*tag_id, *document_id).await? {
                    continue;
                }
                self.db
                    .history
                    .record(*tag_id, *document_id, None, *tagged_at)
                    .await?;
                stats.history_rows_created += 1;
            }
        }

        info!(
            subsystem = "jobs",
            component = "backfill",
            op = "run",
            tags_updated = stats.tags_updated,
            documents_processed = stats.documents_processed,
            history_rows_created = stats.history_rows_created,
            duration_ms = start.elapsed().as_millis() as u64,
            "Taxonomy backfill complete"
        );
        Ok(stats)
    }
}
