//! # taxo-engine
//!
//! Recommendation strategies and the tag manager orchestrator for the
//! taxo tag engine.
//!
//! This crate provides:
//! - The [`strategy::RecommendStrategy`] trait and five concrete
//!   strategies over the cooccurrence graph, usage history, content
//!   categories, trending scores, and string similarity
//! - The [`recommender::Recommender`] deterministic mixer
//! - The [`manager::TagManager`] façade, owner of the document-tagging
//!   and merge transaction scripts
//!
//! ## Example
//!
//! ```ignore
//! use taxo_db::Database;
//! use taxo_engine::TagManager;
//!
//! let db = Database::connect("postgres://...").await?;
//! let manager = TagManager::new(db);
//!
//! let tags = manager
//!     .process_document_tags(document_id, &raw_tags, Some("ana"))
//!     .await?;
//! let suggestions = manager.suggest("pytho", 5).await?;
//! ```

pub mod manager;
pub mod recommender;
pub mod strategies;
pub mod strategy;

// Re-export core types
pub use taxo_core::*;

pub use manager::TagManager;
pub use recommender::Recommender;
pub use strategies::{
    CategoryStrategy, CooccurrenceStrategy, PopularityStrategy, SimilarityStrategy,
    TrendingStrategy, UserHistoryStrategy,
};
pub use strategy::{RecommendContext, RecommendStrategy};
