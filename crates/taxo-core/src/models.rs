//! Data model for the tag intelligence engine.
//!
//! `Tag` is the root entity; metadata, synonyms, cooccurrence edges, usage
//! history and document links all reference it by id and are folded,
//! re-pointed, or deleted together with it inside a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A canonical tag label.
///
/// Identity is case-insensitive post-normalization and immutable once
/// created, except through an explicit merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Per-tag counters and classification, 1:1 with [`Tag`].
///
/// `trending_score` reflects a rolling window and is recomputed by the
/// trending job; it is never accumulated across the tag's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagMetadata {
    pub tag_id: Uuid,
    pub usage_count: i64,
    pub trending_score: f64,
    pub category: Option<String>,
    pub is_approved: bool,
    pub is_trending: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A non-canonical text string permanently redirected to a main tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSynonym {
    pub id: Uuid,
    pub main_tag_id: Uuid,
    pub synonym_text: String,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Compact tag projection used by suggestion and listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
    pub usage_count: i64,
    pub trending_score: f64,
    pub is_trending: bool,
    pub category: Option<String>,
}

/// A tag related to another through the cooccurrence graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedTag {
    pub id: Uuid,
    pub name: String,
    /// Normalized edge strength in `[0, 1]`.
    pub strength: f64,
    /// Raw co-appearance count.
    pub count: i64,
}

/// One append-only usage log row: a tag applied to a document by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUsageEvent {
    pub id: Uuid,
    pub tag_id: Uuid,
    pub document_id: Uuid,
    pub actor: Option<String>,
    pub used_at: DateTime<Utc>,
}

/// How a suggestion matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Query is a substring of the tag name.
    Exact,
    /// Matched by edit-similarity ratio.
    Similar,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Similar => write!(f, "similar"),
        }
    }
}

/// An autocomplete suggestion with the metadata the UI renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub name: String,
    pub usage_count: i64,
    pub is_trending: bool,
    pub category: Option<String>,
    pub match_kind: MatchKind,
    pub score: f64,
}

/// An existing tag matched by edit similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTag {
    pub name: String,
    pub usage_count: i64,
    /// Matching-blocks ratio in `[0, 1]`.
    pub ratio: f64,
}

/// A keyword mined from document content, with its blended score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKeyword {
    pub keyword: String,
    /// Blended score clamped to `[0, 1]`.
    pub score: f64,
    pub frequency: usize,
    pub in_title: bool,
    pub is_tech: bool,
}

/// Which strategy produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendReason {
    Cooccurrence,
    Similarity,
    Popularity,
    Trending,
    UserHistory,
    Category,
}

impl std::fmt::Display for RecommendReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cooccurrence => write!(f, "cooccurrence"),
            Self::Similarity => write!(f, "similarity"),
            Self::Popularity => write!(f, "popularity"),
            Self::Trending => write!(f, "trending"),
            Self::UserHistory => write!(f, "user_history"),
            Self::Category => write!(f, "category"),
        }
    }
}

impl std::str::FromStr for RecommendReason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cooccurrence" => Ok(Self::Cooccurrence),
            "similarity" => Ok(Self::Similarity),
            "popularity" => Ok(Self::Popularity),
            "trending" => Ok(Self::Trending),
            "user_history" | "userhistory" => Ok(Self::UserHistory),
            "category" => Ok(Self::Category),
            _ => Err(format!("Invalid recommend reason: {}", s)),
        }
    }
}

/// A single ranked tag recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub tag: String,
    pub score: f64,
    pub usage_count: i64,
    pub reason: RecommendReason,
}

/// Outcome of normalizing one input in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormalization {
    pub input: String,
    /// Canonical form when the input was valid.
    pub normalized: Option<String>,
    pub error: Option<ValidationError>,
}

/// A rejected item in a batch validation, with the specific failure and
/// best-effort alternatives to show next to the offending input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagItemError {
    pub input: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Result of validating a raw tag list: the surviving canonical tags plus
/// per-item errors. Item failures never abort the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagListValidation {
    pub valid: Vec<String>,
    pub errors: Vec<TagItemError>,
}

/// Grouped suggestion bundle for the document editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSuggestions {
    pub keywords: Vec<String>,
    pub related: Vec<String>,
    pub popular: Vec<String>,
    pub trending: Vec<String>,
    pub mixed: Vec<String>,
}

/// Analytics snapshot for a single tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagAnalytics {
    pub name: String,
    pub usage_count: i64,
    pub trending_score: f64,
    pub is_trending: bool,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub related: Vec<RelatedTag>,
    pub synonyms: Vec<String>,
}
