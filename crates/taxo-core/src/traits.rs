//! Repository traits for the tag store.
//!
//! These traits define the query surface each component of the engine
//! needs, enabling pluggable backends and testability. The concrete
//! PostgreSQL implementations live in `taxo-db`; transaction-aware
//! variants of the mutating operations are inherent methods there so
//! composed transaction scripts can pass an open transaction through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{RelatedTag, Tag, TagMetadata, TagSummary, TagSynonym};
use crate::normalize::SimilarityCandidate;

/// Repository for canonical tags and their metadata (1:1).
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get or create a tag by canonical name. Idempotent; returns the tag
    /// and whether it was created. A metadata row is guaranteed to exist
    /// afterwards.
    async fn create_or_get(&self, name: &str, created_by: Option<&str>) -> Result<(Tag, bool)>;

    /// Fetch a tag by id.
    async fn get(&self, id: Uuid) -> Result<Option<Tag>>;

    /// Fetch a tag by name, case-insensitively.
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Fetch the metadata row for a tag.
    async fn metadata(&self, tag_id: Uuid) -> Result<Option<TagMetadata>>;

    /// Top tags by lifetime usage, optionally restricted to a category.
    async fn popular(&self, limit: i64, category: Option<&str>) -> Result<Vec<TagSummary>>;

    /// Tags currently flagged trending, ordered by trending score.
    async fn trending(&self, limit: i64) -> Result<Vec<TagSummary>>;

    /// Substring search over tag names (autocomplete), ordered by usage.
    async fn search_substring(&self, query: &str, limit: i64) -> Result<Vec<TagSummary>>;

    /// Snapshot of every tag name with its usage count, for fuzzy matching.
    async fn similarity_snapshot(&self) -> Result<Vec<SimilarityCandidate>>;

    /// Snapshot of (tag id, lifetime usage) pairs, for the trending job.
    async fn usage_snapshot(&self) -> Result<Vec<(Uuid, i64)>>;

    /// Write recomputed trending scores and replace the trending flag set,
    /// in one short transaction.
    async fn apply_trending(&self, scores: &[(Uuid, f64)], trending_ids: &[Uuid]) -> Result<()>;

    /// Tags with zero usage whose last use predates `cutoff`.
    async fn unused_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Delete a tag and its dependent rows.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for synonym redirects.
#[async_trait]
pub trait SynonymRepository: Send + Sync {
    /// Resolve a normalized text to its main tag through an active
    /// synonym, if one exists.
    async fn resolve(&self, text: &str) -> Result<Option<Tag>>;

    /// Active synonyms pointing at a tag.
    async fn for_tag(&self, tag_id: Uuid) -> Result<Vec<TagSynonym>>;
}

/// Repository for the cooccurrence graph.
#[async_trait]
pub trait CooccurrenceRepository: Send + Sync {
    /// Edges touching `tag_id` with strength at or above `min_strength`,
    /// ordered by strength descending, ties by count descending.
    async fn related(&self, tag_id: Uuid, limit: i64, min_strength: f64)
        -> Result<Vec<RelatedTag>>;

    /// Raw (count, strength) of the edge between two tags, if present.
    async fn edge(&self, a: Uuid, b: Uuid) -> Result<Option<(i64, f64)>>;
}

/// Repository for the append-only usage log.
#[async_trait]
pub trait UsageHistoryRepository: Send + Sync {
    /// Usage counts per tag since `since`, grouped. One scan feeds the
    /// whole trending recalculation.
    async fn window_counts(&self, since: DateTime<Utc>) -> Result<Vec<(Uuid, i64)>>;

    /// Tags most used by an actor, with per-tag counts.
    async fn top_for_actor(&self, actor: &str, limit: i64) -> Result<Vec<(Tag, i64)>>;

    /// Total history rows for a tag.
    async fn count_for_tag(&self, tag_id: Uuid) -> Result<i64>;
}

/// Repository for document↔tag associations.
#[async_trait]
pub trait DocumentTagRepository: Send + Sync {
    /// Tags linked to a document, ordered by name.
    async fn tags_for_document(&self, document_id: Uuid) -> Result<Vec<Tag>>;

    /// Number of documents linked to a tag.
    async fn document_count_for_tag(&self, tag_id: Uuid) -> Result<i64>;

    /// Every (document_id, tag_id) link. Drives the backfill job.
    async fn all_links(&self) -> Result<Vec<(Uuid, Uuid)>>;
}
