//! Error types for the taxo tag engine.

use thiserror::Error;

/// Result type alias using taxo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Per-tag validation failure.
///
/// Each variant identifies the specific rule a raw tag violated so callers
/// can surface a precise message next to the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input was empty, or nothing survived the cleaning pipeline.
    #[error("Tag is empty after normalization")]
    EmptyAfterClean,

    /// Normalized tag is shorter than the minimum length.
    #[error("Tag must be at least {min} characters")]
    TooShort { min: usize },

    /// Normalized tag exceeds the maximum length.
    #[error("Tag must be {max} characters or less")]
    TooLong { max: usize },

    /// Tag contains characters outside the allowed class.
    #[error("Tag contains invalid characters")]
    InvalidChars,

    /// Tag consists solely of digits.
    #[error("Tag cannot be numbers only")]
    NumericOnly,

    /// Single-token tag is a common stop word.
    #[error("'{0}' is too common a word to be a tag")]
    StopWord(String),
}

/// Core error type for taxo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error). Fatal to the
    /// enclosing operation; composed transactions roll back fully.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A raw tag failed validation. Recoverable; batch operations collect
    /// these per item instead of aborting.
    #[error("Invalid tag: {0}")]
    Validation(#[from] ValidationError),

    /// Tag not found by id.
    #[error("Tag not found: {0}")]
    TagNotFound(uuid::Uuid),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation rejected before any mutation (merge source == target,
    /// duplicate synonym text, synonym shadowing an existing tag).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
