//! Tag manager: the public façade of the tag engine.
//!
//! On the document path, the manager owns the only entry points allowed
//! to mutate metadata, cooccurrence, and history:
//! [`TagManager::process_document_tags`] and [`TagManager::merge`]. It
//! runs each inside one explicit transaction. Everything else here is a
//! read path or a pure computation.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use taxo_core::defaults::{
    MAX_TAGS_PER_DOCUMENT, MIN_EDGE_STRENGTH, MIXED_LIMIT, RELATED_LIMIT,
    SUGGEST_SIMILARITY_THRESHOLD,
};
use taxo_core::{
    CooccurrenceRepository, DocumentTagRepository, Error, KeywordExtractor, MatchKind, Normalizer,
    Recommendation, Result, ScoredKeyword, SynonymRepository, Tag, TagAnalytics, TagItemError,
    TagListValidation, TagRepository, TagSuggestion, TagSummary,
};
use taxo_db::Database;

use crate::recommender::Recommender;
use crate::strategies::{CooccurrenceStrategy, PopularityStrategy, SimilarityStrategy};
use crate::strategy::{RecommendContext, RecommendStrategy};

/// Orchestrates normalization, persistence, and recommendation behind a
/// narrow API consumed by the document-publishing workflow and the
/// suggestion UI.
pub struct TagManager {
    db: Database,
    normalizer: Normalizer,
    extractor: KeywordExtractor,
    recommender: Recommender,
}

impl TagManager {
    /// Create a manager with the default component set.
    pub fn new(db: Database) -> Self {
        let recommender = Recommender::with_defaults(&db);
        Self {
            db,
            normalizer: Normalizer::new(),
            extractor: KeywordExtractor::new(),
            recommender,
        }
    }

    /// Create a manager with explicitly injected components.
    pub fn with_components(
        db: Database,
        normalizer: Normalizer,
        extractor: KeywordExtractor,
        recommender: Recommender,
    ) -> Self {
        Self {
            db,
            normalizer,
            extractor,
            recommender,
        }
    }

    /// Borrow the normalizer (pre-save validation in the caller's UI).
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    // =========================================================================
    // CANONICALIZATION
    // =========================================================================

    /// Normalize a raw tag and follow a synonym redirect if one exists.
    pub async fn canonical_form(&self, raw: &str) -> Result<String> {
        let normalized = self.normalizer.normalize(raw)?;
        match self.db.synonyms.resolve(&normalized).await? {
            Some(main) => Ok(main.name),
            None => Ok(normalized),
        }
    }

    /// Get or create the canonical tag for a raw input.
    ///
    /// Idempotent: two calls with equivalent raw text resolve to the same
    /// tag row, and the second reports `created = false`.
    pub async fn create_or_get(&self, raw: &str, actor: Option<&str>) -> Result<(Tag, bool)> {
        let canonical = self.canonical_form(raw).await?;
        self.db.tags.create_or_get(&canonical, actor).await
    }

    // =========================================================================
    // TRANSACTION SCRIPTS
    // =========================================================================

    /// Process a document's tag set: create-or-get each tag, bump usage,
    /// append history, link the document, then update the cooccurrence
    /// graph over the full resolved set, all in one transaction.
    ///
    /// Individual tags that fail validation are skipped and logged; a
    /// store failure rolls the whole operation back.
    pub async fn process_document_tags(
        &self,
        document_id: Uuid,
        raw_tags: &[String],
        actor: Option<&str>,
    ) -> Result<Vec<Tag>> {
        let start = Instant::now();

        let mut canonicals: Vec<String> = Vec::with_capacity(raw_tags.len());
        for raw in raw_tags {
            match self.canonical_form(raw).await {
                Ok(canonical) => {
                    if !canonicals.contains(&canonical) {
                        canonicals.push(canonical);
                    }
                }
                Err(Error::Validation(err)) => {
                    warn!(
                        subsystem = "engine",
                        component = "manager",
                        op = "process_document_tags",
                        input = %raw,
                        error = %err,
                        "Skipping invalid tag"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        let now = Utc::now();
        let mut tx = self.db.pool.begin().await.map_err(Error::Database)?;
        let mut tags: Vec<Tag> = Vec::with_capacity(canonicals.len());

        for name in &canonicals {
            let (tag, _) = self.db.tags.create_or_get_tx(&mut tx, name, actor).await?;
            self.db.tags.increment_usage_tx(&mut tx, tag.id, now).await?;
            self.db
                .history
                .record_tx(&mut tx, tag.id, document_id, actor, now)
                .await?;
            self.db
                .documents
                .link_tx(&mut tx, document_id, tag.id, now)
                .await?;
            tags.push(tag);
        }

        if tags.len() >= 2 {
            let ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
            self.db
                .cooccurrence
                .update_from_document_tags_tx(&mut tx, &ids)
                .await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "engine",
            component = "manager",
            op = "process_document_tags",
            document_id = %document_id,
            tag_count = tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document tags processed"
        );
        Ok(tags)
    }

    /// Merge `source` into `target`: re-point history, document links and
    /// synonym redirects, fold cooccurrence edges, transfer the usage
    /// count, delete the source, and leave a synonym behind, atomically.
    ///
    /// After commit no row references the source tag.
    pub async fn merge(&self, source_id: Uuid, target_id: Uuid, actor: Option<&str>) -> Result<()> {
        if source_id == target_id {
            return Err(Error::Conflict(
                "cannot merge a tag into itself".to_string(),
            ));
        }

        let source = self
            .db
            .tags
            .get(source_id)
            .await?
            .ok_or(Error::TagNotFound(source_id))?;
        let target = self
            .db
            .tags
            .get(target_id)
            .await?
            .ok_or(Error::TagNotFound(target_id))?;
        let source_usage = self
            .db
            .tags
            .metadata(source_id)
            .await?
            .map(|m| m.usage_count)
            .unwrap_or(0);

        let mut tx = self.db.pool.begin().await.map_err(Error::Database)?;

        self.db.history.repoint_tx(&mut tx, source.id, target.id).await?;
        self.db
            .documents
            .repoint_tx(&mut tx, source.id, target.id)
            .await?;
        self.db
            .cooccurrence
            .fold_into_tx(&mut tx, source.id, target.id)
            .await?;
        self.db
            .synonyms
            .repoint_tx(&mut tx, source.id, target.id)
            .await?;

        if source_usage > 0 {
            self.db
                .tags
                .add_usage_tx(&mut tx, target.id, source_usage)
                .await?;
        }
        self.db
            .cooccurrence
            .recompute_for_tag_tx(&mut tx, target.id)
            .await?;

        self.db.tags.delete_tx(&mut tx, source.id).await?;
        self.db
            .synonyms
            .create_tx(&mut tx, target.id, &target.name, &source.name, actor)
            .await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "engine",
            component = "manager",
            op = "merge",
            source = %source.name,
            target = %target.name,
            transferred_usage = source_usage,
            "Tags merged"
        );
        Ok(())
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Validate and normalize a raw tag list with the default per-document
    /// limit.
    pub async fn validate_and_normalize(&self, raw_tags: &[String]) -> Result<TagListValidation> {
        self.validate_tag_list(raw_tags, MAX_TAGS_PER_DOCUMENT).await
    }

    /// Validate a raw tag list: enforce the max count, normalize each
    /// item, de-duplicate post-normalization, and collect per-item errors
    /// (with suggested alternatives) without aborting the batch.
    pub async fn validate_tag_list(
        &self,
        raw_tags: &[String],
        max_tags: usize,
    ) -> Result<TagListValidation> {
        let mut result = TagListValidation::default();
        let mut candidates = None;

        for (index, raw) in raw_tags.iter().enumerate() {
            if index >= max_tags {
                result.errors.push(TagItemError {
                    input: raw.clone(),
                    message: format!("exceeds the {}-tag limit", max_tags),
                    suggestions: Vec::new(),
                });
                continue;
            }
            match self.normalizer.normalize(raw) {
                Ok(normalized) => {
                    if result.valid.contains(&normalized) {
                        result.errors.push(TagItemError {
                            input: raw.clone(),
                            message: format!("duplicate of '{}'", normalized),
                            suggestions: Vec::new(),
                        });
                    } else {
                        result.valid.push(normalized);
                    }
                }
                Err(err) => {
                    if candidates.is_none() {
                        candidates = Some(self.db.tags.similarity_snapshot().await?);
                    }
                    let pool = candidates.as_deref().unwrap_or_default();
                    result.errors.push(TagItemError {
                        input: raw.clone(),
                        message: err.to_string(),
                        suggestions: self.normalizer.suggest_alternatives(raw, pool),
                    });
                }
            }
        }

        Ok(result)
    }

    // =========================================================================
    // SUGGESTION SURFACE
    // =========================================================================

    /// Autocomplete: substring matches first, similarity fill when they
    /// run short, ranked by (score, usage). Queries shorter than two
    /// characters return nothing.
    pub async fn suggest(&self, query: &str, limit: i64) -> Result<Vec<TagSuggestion>> {
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let mut suggestions: Vec<TagSuggestion> = self
            .db
            .tags
            .search_substring(query, limit)
            .await?
            .into_iter()
            .map(|summary| TagSuggestion {
                name: summary.name,
                usage_count: summary.usage_count,
                is_trending: summary.is_trending,
                category: summary.category,
                match_kind: MatchKind::Exact,
                score: 1.0,
            })
            .collect();

        if (suggestions.len() as i64) < limit {
            let candidates = self.db.tags.similarity_snapshot().await?;
            for similar in self.normalizer.find_similar(
                query,
                &candidates,
                Some(SUGGEST_SIMILARITY_THRESHOLD),
            ) {
                if suggestions.iter().any(|s| s.name == similar.name) {
                    continue;
                }
                suggestions.push(TagSuggestion {
                    name: similar.name,
                    usage_count: similar.usage_count,
                    is_trending: false,
                    category: None,
                    match_kind: MatchKind::Similar,
                    score: similar.ratio,
                });
                if (suggestions.len() as i64) >= limit {
                    break;
                }
            }
        }

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.usage_count.cmp(&a.usage_count))
                .then_with(|| a.name.cmp(&b.name))
        });
        suggestions.truncate(limit as usize);

        debug!(
            subsystem = "engine",
            component = "manager",
            op = "suggest",
            query = %query,
            result_count = suggestions.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Autocomplete served"
        );
        Ok(suggestions)
    }

    /// Tags related to an existing tag set through the cooccurrence graph.
    pub async fn related(
        &self,
        existing_tags: &[String],
        limit: i64,
    ) -> Result<Vec<Recommendation>> {
        let ctx = RecommendContext::new(limit).with_existing_tags(existing_tags.to_vec());
        CooccurrenceStrategy::new(self.db.clone())
            .recommend(&ctx)
            .await
    }

    /// Most-used tags, optionally within a category.
    pub async fn popular(&self, limit: i64, category: Option<&str>) -> Result<Vec<TagSummary>> {
        self.db.tags.popular(limit, category).await
    }

    /// Popularity as scored recommendations (usage normalized for
    /// comparability with the other strategies).
    pub async fn popular_recommendations(
        &self,
        limit: i64,
        category: Option<&str>,
    ) -> Result<Vec<Recommendation>> {
        PopularityStrategy::new(self.db.clone()).top(limit, category).await
    }

    /// Currently trending tags. The scores and flags are maintained by
    /// the periodic trending job over its configured window; `days` is
    /// accepted for interface symmetry and does not trigger a recompute.
    pub async fn trending(&self, _days: i64, limit: i64) -> Result<Vec<TagSummary>> {
        self.db.tags.trending(limit).await
    }

    /// Fuzzy-match recommendations for a free-text query.
    pub async fn similar(&self, query: &str, limit: i64) -> Result<Vec<Recommendation>> {
        SimilarityStrategy::new(self.db.clone(), self.normalizer.clone())
            .for_query(query, limit)
            .await
    }

    /// Scored keyword candidates mined from a document's title and body.
    pub fn keyword_candidates(
        &self,
        title: &str,
        body_html: &str,
        limit: usize,
    ) -> Vec<ScoredKeyword> {
        let mut keywords = self.extractor.extract(title, body_html);
        keywords.truncate(limit);
        keywords
    }

    /// Keyword-derived tag suggestions, converged onto the existing
    /// taxonomy's spellings.
    pub async fn extract_tag_suggestions(
        &self,
        title: &str,
        body_html: &str,
    ) -> Result<Vec<String>> {
        let keywords: Vec<String> = self
            .extractor
            .extract(title, body_html)
            .into_iter()
            .take(10)
            .map(|k| k.keyword)
            .collect();

        let existing: HashMap<String, String> = self
            .db
            .tags
            .similarity_snapshot()
            .await?
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c.name))
            .collect();

        Ok(self
            .extractor
            .suggest_tags_from_keywords(&keywords, &existing, &self.normalizer))
    }

    /// Blended recommendations across every weighted strategy.
    pub async fn mixed_recommendations(
        &self,
        ctx: &RecommendContext,
    ) -> Result<Vec<Recommendation>> {
        self.recommender.mixed(ctx).await
    }

    /// The grouped suggestion bundle the document editor renders.
    pub async fn suggestions_for_document(
        &self,
        title: &str,
        body_html: &str,
        existing_tags: &[String],
        actor: Option<&str>,
    ) -> Result<taxo_core::DocumentSuggestions> {
        let mut bundle = taxo_core::DocumentSuggestions::default();

        if !title.is_empty() || !body_html.is_empty() {
            bundle.keywords = self
                .extract_tag_suggestions(title, body_html)
                .await?
                .into_iter()
                .take(8)
                .collect();
        }
        if !existing_tags.is_empty() {
            bundle.related = self
                .related(existing_tags, RELATED_LIMIT)
                .await?
                .into_iter()
                .map(|r| r.tag)
                .collect();
        }
        bundle.popular = self
            .popular(10, None)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        bundle.trending = self
            .trending(7, 8)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let mut ctx = RecommendContext::new(MIXED_LIMIT)
            .with_existing_tags(existing_tags.to_vec())
            .with_content(format!("{} {}", title, body_html));
        if let Some(actor) = actor {
            ctx = ctx.with_actor(actor);
        }
        bundle.mixed = self
            .recommender
            .mixed(&ctx)
            .await?
            .into_iter()
            .map(|r| r.tag)
            .collect();

        Ok(bundle)
    }

    // =========================================================================
    // ANALYTICS & MAINTENANCE
    // =========================================================================

    /// Analytics snapshot for one tag: counters, related edges, synonyms.
    pub async fn tag_analytics(&self, name: &str) -> Result<TagAnalytics> {
        let tag = self
            .db
            .tags
            .get_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("tag '{}'", name)))?;
        let metadata = self.db.tags.metadata(tag.id).await?;
        let related = self
            .db
            .cooccurrence
            .related(tag.id, RELATED_LIMIT, MIN_EDGE_STRENGTH)
            .await?;
        let synonyms = self
            .db
            .synonyms
            .for_tag(tag.id)
            .await?
            .into_iter()
            .map(|s| s.synonym_text)
            .collect();

        Ok(match metadata {
            Some(meta) => TagAnalytics {
                name: tag.name,
                usage_count: meta.usage_count,
                trending_score: meta.trending_score,
                is_trending: meta.is_trending,
                category: meta.category,
                created_at: meta.created_at,
                last_used: meta.last_used,
                related,
                synonyms,
            },
            None => TagAnalytics {
                name: tag.name,
                usage_count: 0,
                trending_score: 0.0,
                is_trending: false,
                category: None,
                created_at: tag.created_at,
                last_used: tag.created_at,
                related,
                synonyms,
            },
        })
    }

    /// Delete tags that have zero usage, no document links, and no use in
    /// the last `days`. Returns how many were removed.
    pub async fn cleanup_unused(&self, days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(days);
        let candidates = self.db.tags.unused_candidates(cutoff).await?;

        let mut removed = 0u64;
        for tag_id in candidates {
            if self.db.documents.document_count_for_tag(tag_id).await? > 0 {
                continue;
            }
            self.db.tags.delete(tag_id).await?;
            removed += 1;
        }

        info!(
            subsystem = "engine",
            component = "manager",
            op = "cleanup_unused",
            days,
            removed,
            "Unused tags cleaned up"
        );
        Ok(removed)
    }
}
