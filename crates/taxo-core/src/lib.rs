//! # taxo-core
//!
//! Core types, traits, and tag algorithms for the taxo tag engine.
//!
//! This crate provides the foundational data structures, the error
//! taxonomy, the repository trait definitions, and the two pure
//! algorithmic components (the tag [`normalize::Normalizer`] and the
//! [`keywords::KeywordExtractor`]) that the other taxo crates build on.

pub mod defaults;
pub mod error;
pub mod keywords;
pub mod lexicon;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result, ValidationError};
pub use keywords::{score_keyword, KeywordExtractor, KeywordExtractorConfig};
pub use models::*;
pub use normalize::{Normalizer, NormalizerConfig, SimilarityCandidate};
pub use traits::*;
pub use uuid_utils::{extract_timestamp, new_v7};
