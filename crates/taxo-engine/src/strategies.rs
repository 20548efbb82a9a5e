//! Concrete recommendation strategies.
//!
//! Four weighted strategies participate in the mixed blend (cooccurrence,
//! user history, content category, trending); similarity and popularity
//! are standalone sources the manager queries directly.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use taxo_core::defaults::{
    MIN_EDGE_STRENGTH, POPULARITY_SCORE_SCALE, SUGGEST_SIMILARITY_THRESHOLD, WEIGHT_CATEGORY,
    WEIGHT_COOCCURRENCE, WEIGHT_TRENDING, WEIGHT_USER_HISTORY,
};
use taxo_core::lexicon::CATEGORY_KEYWORDS;
use taxo_core::{
    CooccurrenceRepository, Normalizer, Recommendation, RecommendReason, Result, TagRepository,
    UsageHistoryRepository,
};
use taxo_db::Database;

use crate::strategy::{RecommendContext, RecommendStrategy};

/// Union the cooccurrence edges of `seed_names`, summing strength across
/// multiple paths to the same candidate and excluding `exclude` names
/// (case-insensitively). Shared by the cooccurrence and user-history
/// strategies.
async fn expand_by_cooccurrence(
    db: &Database,
    seed_names: &[String],
    exclude: &HashSet<String>,
    limit: i64,
    reason: RecommendReason,
) -> Result<Vec<Recommendation>> {
    let mut blended: HashMap<String, Recommendation> = HashMap::new();

    for name in seed_names {
        let Some(tag) = db.tags.get_by_name(name).await? else {
            continue;
        };
        let related = db
            .cooccurrence
            .related(tag.id, limit * 2, MIN_EDGE_STRENGTH)
            .await?;
        for edge in related {
            if exclude.contains(&edge.name.to_lowercase()) {
                continue;
            }
            blended
                .entry(edge.name.clone())
                .and_modify(|rec| {
                    rec.score += edge.strength;
                    rec.usage_count += edge.count;
                })
                .or_insert(Recommendation {
                    tag: edge.name,
                    score: edge.strength,
                    usage_count: edge.count,
                    reason,
                });
        }
    }

    let mut recommendations: Vec<Recommendation> = blended.into_values().collect();
    sort_ranked(&mut recommendations);
    recommendations.truncate(limit as usize);
    Ok(recommendations)
}

/// Deterministic ranking: score descending, ties by tag name ascending.
fn sort_ranked(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.tag.cmp(&b.tag))
    });
}

fn lowercase_set(names: &[String]) -> HashSet<String> {
    names.iter().map(|n| n.to_lowercase()).collect()
}

// =============================================================================
// WEIGHTED STRATEGIES (mixed blend)
// =============================================================================

/// Recommends tags that historically appear together with the document's
/// current tag set.
pub struct CooccurrenceStrategy {
    db: Database,
}

impl CooccurrenceStrategy {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendStrategy for CooccurrenceStrategy {
    fn name(&self) -> &'static str {
        "cooccurrence"
    }

    fn weight(&self) -> f64 {
        WEIGHT_COOCCURRENCE
    }

    async fn recommend(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
        if ctx.existing_tags.is_empty() {
            return Ok(Vec::new());
        }
        expand_by_cooccurrence(
            &self.db,
            &ctx.existing_tags,
            &lowercase_set(&ctx.existing_tags),
            ctx.limit,
            RecommendReason::Cooccurrence,
        )
        .await
    }
}

/// Recommends from the acting user's most-used tags, expanded one hop
/// through the cooccurrence graph.
pub struct UserHistoryStrategy {
    db: Database,
    /// How many of the actor's top tags seed the expansion.
    seed_limit: i64,
}

impl UserHistoryStrategy {
    pub fn new(db: Database) -> Self {
        Self { db, seed_limit: 10 }
    }
}

#[async_trait]
impl RecommendStrategy for UserHistoryStrategy {
    fn name(&self) -> &'static str {
        "user_history"
    }

    fn weight(&self) -> f64 {
        WEIGHT_USER_HISTORY
    }

    async fn recommend(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
        let Some(actor) = ctx.actor.as_deref() else {
            return Ok(Vec::new());
        };
        let top = self.db.history.top_for_actor(actor, self.seed_limit).await?;
        if top.is_empty() {
            return Ok(Vec::new());
        }

        let seeds: Vec<String> = top.into_iter().map(|(tag, _)| tag.name).collect();
        let mut exclude = lowercase_set(&seeds);
        exclude.extend(lowercase_set(&ctx.existing_tags));

        expand_by_cooccurrence(
            &self.db,
            &seeds,
            &exclude,
            ctx.limit,
            RecommendReason::UserHistory,
        )
        .await
    }
}

/// Scores the content against the category keyword table and recommends
/// popular tags from the top-scoring categories.
pub struct CategoryStrategy {
    db: Database,
}

impl CategoryStrategy {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Categories present in the content, ordered by keyword hits
    /// descending, ties by category name.
    fn score_categories(content: &str) -> Vec<(&'static str, usize)> {
        let lowered = content.to_lowercase();
        let mut scored: Vec<(&'static str, usize)> = CATEGORY_KEYWORDS
            .iter()
            .filter_map(|(category, keywords)| {
                let hits = keywords.iter().filter(|k| lowered.contains(*k)).count();
                (hits > 0).then_some((*category, hits))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored
    }
}

#[async_trait]
impl RecommendStrategy for CategoryStrategy {
    fn name(&self) -> &'static str {
        "category"
    }

    fn weight(&self) -> f64 {
        WEIGHT_CATEGORY
    }

    async fn recommend(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
        let Some(content) = ctx.content.as_deref() else {
            return Ok(Vec::new());
        };
        let categories = Self::score_categories(content);
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let exclude = lowercase_set(&ctx.existing_tags);
        let mut recommendations: Vec<Recommendation> = Vec::new();
        for (category, hits) in categories.into_iter().take(3) {
            debug!(
                subsystem = "engine",
                component = "recommender",
                strategy = "category",
                category,
                hits,
                "Category matched content"
            );
            for summary in self.db.tags.popular(3, Some(category)).await? {
                if exclude.contains(&summary.name.to_lowercase())
                    || recommendations.iter().any(|r| r.tag == summary.name)
                {
                    continue;
                }
                recommendations.push(Recommendation {
                    tag: summary.name,
                    score: summary.usage_count as f64 / POPULARITY_SCORE_SCALE,
                    usage_count: summary.usage_count,
                    reason: RecommendReason::Category,
                });
            }
        }

        sort_ranked(&mut recommendations);
        recommendations.truncate(ctx.limit as usize);
        Ok(recommendations)
    }
}

/// Recommends the currently trending tags.
pub struct TrendingStrategy {
    db: Database,
}

impl TrendingStrategy {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendStrategy for TrendingStrategy {
    fn name(&self) -> &'static str {
        "trending"
    }

    fn weight(&self) -> f64 {
        WEIGHT_TRENDING
    }

    async fn recommend(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
        let exclude = lowercase_set(&ctx.existing_tags);
        let mut recommendations: Vec<Recommendation> = self
            .db
            .tags
            .trending(ctx.limit)
            .await?
            .into_iter()
            .filter(|summary| !exclude.contains(&summary.name.to_lowercase()))
            .map(|summary| Recommendation {
                tag: summary.name,
                score: summary.trending_score,
                usage_count: summary.usage_count,
                reason: RecommendReason::Trending,
            })
            .collect();
        sort_ranked(&mut recommendations);
        Ok(recommendations)
    }
}

// =============================================================================
// STANDALONE STRATEGIES
// =============================================================================

/// Fuzzy-matches a query against the full tag snapshot. Serves the
/// autocomplete fill path; not part of the mixed blend.
pub struct SimilarityStrategy {
    db: Database,
    normalizer: Normalizer,
}

impl SimilarityStrategy {
    pub fn new(db: Database, normalizer: Normalizer) -> Self {
        Self { db, normalizer }
    }

    /// Tags similar to `query` at the suggestion threshold; score is the
    /// raw matching ratio.
    pub async fn for_query(&self, query: &str, limit: i64) -> Result<Vec<Recommendation>> {
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let candidates = self.db.tags.similarity_snapshot().await?;
        let recommendations = self
            .normalizer
            .find_similar(query, &candidates, Some(SUGGEST_SIMILARITY_THRESHOLD))
            .into_iter()
            .take(limit as usize)
            .map(|similar| Recommendation {
                tag: similar.name,
                score: similar.ratio,
                usage_count: similar.usage_count,
                reason: RecommendReason::Similarity,
            })
            .collect();
        Ok(recommendations)
    }
}

/// Top tags by lifetime usage, optionally within a category. Not part of
/// the mixed blend.
pub struct PopularityStrategy {
    db: Database,
}

impl PopularityStrategy {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn top(&self, limit: i64, category: Option<&str>) -> Result<Vec<Recommendation>> {
        let recommendations = self
            .db
            .tags
            .popular(limit, category)
            .await?
            .into_iter()
            .map(|summary| Recommendation {
                tag: summary.name,
                score: summary.usage_count as f64 / POPULARITY_SCORE_SCALE,
                usage_count: summary.usage_count,
                reason: RecommendReason::Popularity,
            })
            .collect();
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_categories_orders_by_hits() {
        let scored = CategoryStrategy::score_categories(
            "despliegue con docker y kubernetes en un servidor con html",
        );
        assert_eq!(scored[0].0, "devops");
        assert_eq!(scored[0].1, 3);
        assert!(scored.iter().any(|(c, _)| *c == "web"));
    }

    #[test]
    fn test_score_categories_empty_content() {
        assert!(CategoryStrategy::score_categories("sin coincidencias").is_empty());
    }

    #[test]
    fn test_sort_ranked_breaks_ties_by_name() {
        let mut recs = vec![
            Recommendation {
                tag: "zeta".into(),
                score: 0.5,
                usage_count: 0,
                reason: RecommendReason::Cooccurrence,
            },
            Recommendation {
                tag: "alpha".into(),
                score: 0.5,
                usage_count: 0,
                reason: RecommendReason::Cooccurrence,
            },
            Recommendation {
                tag: "mid".into(),
                score: 0.9,
                usage_count: 0,
                reason: RecommendReason::Cooccurrence,
            },
        ];
        sort_ranked(&mut recs);
        let names: Vec<&str> = recs.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(names, vec!["mid", "alpha", "zeta"]);
    }
}
