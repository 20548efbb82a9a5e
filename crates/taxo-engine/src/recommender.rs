//! Multi-strategy recommendation blending.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use taxo_core::{Recommendation, Result};
use taxo_db::Database;

use crate::strategies::{
    CategoryStrategy, CooccurrenceStrategy, TrendingStrategy, UserHistoryStrategy,
};
use crate::strategy::{RecommendContext, RecommendStrategy};

/// Blends an explicit list of strategies into one ranked suggestion list.
///
/// Construction is explicit dependency injection: the strategy list is
/// passed at startup and never consulted from global state.
pub struct Recommender {
    strategies: Vec<Arc<dyn RecommendStrategy>>,
}

impl Recommender {
    /// Create a recommender over an explicit strategy list.
    pub fn new(strategies: Vec<Arc<dyn RecommendStrategy>>) -> Self {
        Self { strategies }
    }

    /// The default weighted blend: cooccurrence, user history, content
    /// category, and trending.
    pub fn with_defaults(db: &Database) -> Self {
        Self::new(vec![
            Arc::new(CooccurrenceStrategy::new(db.clone())),
            Arc::new(UserHistoryStrategy::new(db.clone())),
            Arc::new(CategoryStrategy::new(db.clone())),
            Arc::new(TrendingStrategy::new(db.clone())),
        ])
    }

    /// Run every weighted strategy and accumulate `score × weight` per
    /// candidate tag; a tag recommended by two strategies gets both
    /// contributions. Output is sorted score descending with ties broken
    /// by tag name ascending, so identical inputs over a stable snapshot
    /// reproduce the same order.
    pub async fn mixed(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        let mut blended: HashMap<String, Recommendation> = HashMap::new();

        for strategy in &self.strategies {
            let weight = strategy.weight();
            if weight <= 0.0 {
                continue;
            }
            let recommendations = strategy.recommend(ctx).await?;
            debug!(
                subsystem = "engine",
                component = "recommender",
                strategy = strategy.name(),
                weight,
                result_count = recommendations.len(),
                "Strategy contributed"
            );
            for rec in recommendations {
                let contribution = rec.score * weight;
                blended
                    .entry(rec.tag.clone())
                    .and_modify(|existing| existing.score += contribution)
                    .or_insert(Recommendation {
                        score: contribution,
                        ..rec
                    });
            }
        }

        let mut ranked: Vec<Recommendation> = blended.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tag.cmp(&b.tag))
        });
        ranked.truncate(ctx.limit as usize);

        debug!(
            subsystem = "engine",
            component = "recommender",
            op = "mixed",
            result_count = ranked.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Mixed recommendations complete"
        );
        Ok(ranked)
    }

    /// Borrow the injected strategies (used by tests and diagnostics).
    pub fn strategies(&self) -> &[Arc<dyn RecommendStrategy>] {
        &self.strategies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use taxo_core::RecommendReason;

    /// Fixed-output strategy for exercising the blend without a store.
    struct FixedStrategy {
        name: &'static str,
        weight: f64,
        recs: Vec<(&'static str, f64)>,
    }

    #[async_trait]
    impl RecommendStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn weight(&self) -> f64 {
            self.weight
        }

        async fn recommend(&self, _ctx: &RecommendContext) -> Result<Vec<Recommendation>> {
            Ok(self
                .recs
                .iter()
                .map(|(tag, score)| Recommendation {
                    tag: (*tag).to_string(),
                    score: *score,
                    usage_count: 0,
                    reason: RecommendReason::Cooccurrence,
                })
                .collect())
        }
    }

    fn fixed(name: &'static str, weight: f64, recs: Vec<(&'static str, f64)>) -> Arc<dyn RecommendStrategy> {
        Arc::new(FixedStrategy { name, weight, recs })
    }

    #[tokio::test]
    async fn test_mixed_accumulates_across_strategies() {
        let recommender = Recommender::new(vec![
            fixed("a", 0.4, vec![("shared", 1.0), ("only-a", 1.0)]),
            fixed("b", 0.1, vec![("shared", 1.0), ("only-b", 1.0)]),
        ]);
        let ranked = recommender.mixed(&RecommendContext::new(10)).await.unwrap();

        let shared = ranked.iter().find(|r| r.tag == "shared").unwrap();
        assert!((shared.score - 0.5).abs() < 1e-9);
        assert_eq!(ranked[0].tag, "shared");
    }

    #[tokio::test]
    async fn test_mixed_applies_strategy_weight() {
        let recommender = Recommender::new(vec![
            fixed("heavy", 0.4, vec![("from-heavy", 0.5)]),
            fixed("light", 0.1, vec![("from-light", 0.9)]),
        ]);
        let ranked = recommender.mixed(&RecommendContext::new(10)).await.unwrap();

        // 0.5 × 0.4 = 0.20 beats 0.9 × 0.1 = 0.09.
        assert_eq!(ranked[0].tag, "from-heavy");
    }

    #[tokio::test]
    async fn test_mixed_ties_broken_by_name() {
        let recommender = Recommender::new(vec![fixed(
            "a",
            1.0,
            vec![("zeta", 0.5), ("alpha", 0.5), ("mid", 0.5)],
        )]);
        let ranked = recommender.mixed(&RecommendContext::new(10)).await.unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_mixed_skips_zero_weight_strategies() {
        let recommender = Recommender::new(vec![
            fixed("weighted", 0.4, vec![("kept", 1.0)]),
            fixed("standalone", 0.0, vec![("dropped", 1.0)]),
        ]);
        let ranked = recommender.mixed(&RecommendContext::new(10)).await.unwrap();
        assert!(ranked.iter().any(|r| r.tag == "kept"));
        assert!(!ranked.iter().any(|r| r.tag == "dropped"));
    }

    #[tokio::test]
    async fn test_mixed_truncates_to_limit() {
        let recommender = Recommender::new(vec![fixed(
            "a",
            1.0,
            vec![("one", 0.9), ("two", 0.8), ("three", 0.7)],
        )]);
        let ranked = recommender.mixed(&RecommendContext::new(2)).await.unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_mixed_is_deterministic() {
        let build = || {
            Recommender::new(vec![
                fixed("a", 0.4, vec![("x", 0.3), ("y", 0.3), ("z", 0.3)]),
                fixed("b", 0.3, vec![("y", 0.2), ("w", 0.9)]),
            ])
        };
        let first = build().mixed(&RecommendContext::new(10)).await.unwrap();
        for _ in 0..5 {
            let again = build().mixed(&RecommendContext::new(10)).await.unwrap();
            let names: Vec<&str> = again.iter().map(|r| r.tag.as_str()).collect();
            let expected: Vec<&str> = first.iter().map(|r| r.tag.as_str()).collect();
            assert_eq!(names, expected);
        }
    }
}
