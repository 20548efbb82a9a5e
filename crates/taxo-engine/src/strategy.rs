//! Recommendation strategy abstraction.
//!
//! Strategies are constructed explicitly and passed to the
//! [`crate::recommender::Recommender`] at startup; there is no ambient
//! registry. A strategy's `weight` is its share in the mixed blend; the
//! standalone strategies (similarity, popularity) are invoked directly by
//! the manager and carry no blend weight.

use async_trait::async_trait;

use taxo_core::{Recommendation, Result};

/// Inputs a strategy may draw on. Every field is optional except the
/// limit; strategies ignore what they do not use.
#[derive(Debug, Clone, Default)]
pub struct RecommendContext {
    /// Tags already attached to the document being edited.
    pub existing_tags: Vec<String>,
    /// Title + body text for content-based strategies.
    pub content: Option<String>,
    /// Acting user, for history-based personalization.
    pub actor: Option<String>,
    /// Maximum candidates a strategy should return.
    pub limit: i64,
}

impl RecommendContext {
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_existing_tags(mut self, tags: Vec<String>) -> Self {
        self.existing_tags = tags;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// One independent source of ranked tag candidates.
#[async_trait]
pub trait RecommendStrategy: Send + Sync {
    /// Stable strategy name, used in logs.
    fn name(&self) -> &'static str;

    /// Share of this strategy in the mixed blend.
    fn weight(&self) -> f64;

    /// Produce ranked candidates for the given context. Strategies return
    /// an empty list when their inputs are absent rather than erroring.
    async fn recommend(&self, ctx: &RecommendContext) -> Result<Vec<Recommendation>>;
}
