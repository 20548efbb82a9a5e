//! Centralized default constants for the taxo tag engine.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Minimum canonical tag length, inclusive.
pub const MIN_TAG_LENGTH: usize = 2;

/// Maximum canonical tag length, inclusive.
pub const MAX_TAG_LENGTH: usize = 30;

/// Default ratio threshold for near-duplicate detection.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Looser ratio threshold used for suggestions and autocomplete fill.
pub const SUGGEST_SIMILARITY_THRESHOLD: f64 = 0.6;

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// Minimum token length considered a keyword candidate.
pub const MIN_WORD_LENGTH: usize = 3;

/// Maximum token length considered a keyword candidate.
pub const MAX_WORD_LENGTH: usize = 30;

/// Minimum combined frequency for non-tech, non-title candidates.
pub const MIN_KEYWORD_FREQUENCY: usize = 2;

/// Maximum keywords returned per extraction.
pub const MAX_KEYWORDS: usize = 20;

// =============================================================================
// COOCCURRENCE GRAPH
// =============================================================================

/// Relevance floor for related-tag queries; weaker edges are noise.
pub const MIN_EDGE_STRENGTH: f64 = 0.1;

// =============================================================================
// TAGGING
// =============================================================================

/// Maximum tags accepted on a single document.
pub const MAX_TAGS_PER_DOCUMENT: usize = 10;

// =============================================================================
// RECOMMENDATION
// =============================================================================

/// Mixed-blend weight of the cooccurrence strategy.
pub const WEIGHT_COOCCURRENCE: f64 = 0.4;

/// Mixed-blend weight of the user-history strategy.
pub const WEIGHT_USER_HISTORY: f64 = 0.3;

/// Mixed-blend weight of the content-category strategy.
pub const WEIGHT_CATEGORY: f64 = 0.2;

/// Mixed-blend weight of the trending strategy.
pub const WEIGHT_TRENDING: f64 = 0.1;

/// usage_count divisor that puts popularity scores on the same scale as
/// the other strategies.
pub const POPULARITY_SCORE_SCALE: f64 = 100.0;

/// Default result counts per surface.
pub const SUGGEST_LIMIT: i64 = 10;
pub const RELATED_LIMIT: i64 = 5;
pub const POPULAR_LIMIT: i64 = 20;
pub const TRENDING_LIMIT: i64 = 10;
pub const MIXED_LIMIT: i64 = 10;

// =============================================================================
// JOBS
// =============================================================================

/// Rolling window for trending recalculation, in days.
pub const TRENDING_WINDOW_DAYS: i64 = 7;

/// Fraction of scored tags marked `is_trending`.
pub const TRENDING_TOP_FRACTION: f64 = 0.10;

/// Minimum lifetime usage before a tag is eligible for the trending flag.
/// Prevents a single recent spike on a near-unused tag from dominating.
pub const TRENDING_MIN_USAGE: i64 = 5;

/// Days without use before a zero-usage tag is eligible for cleanup.
pub const CLEANUP_UNUSED_DAYS: i64 = 180;
