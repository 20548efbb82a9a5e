//! Tag normalization, validation, and fuzzy matching.
//!
//! The normalizer turns free-text tag input into a stable canonical form:
//! lowercase, diacritics folded, separators collapsed to single hyphens.
//! Normalization is idempotent (`normalize(normalize(x)) == normalize(x)`
//! for every valid input) and deterministic regardless of call order.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use similar::TextDiff;

use crate::defaults::{MAX_TAG_LENGTH, MIN_TAG_LENGTH, SIMILARITY_THRESHOLD};
use crate::error::ValidationError;
use crate::lexicon::{COMMON_CORRECTIONS, STOP_WORDS};
use crate::models::{BatchNormalization, SimilarTag};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]+").unwrap());
static ALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9\s_.-]+$").unwrap());
static PUNCT_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s_.-]+$").unwrap());

/// An existing tag the fuzzy matcher compares against: the canonical name
/// plus its usage count for tie-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCandidate {
    pub name: String,
    pub usage_count: i64,
}

/// Normalizer configuration.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Minimum canonical tag length, inclusive.
    pub min_length: usize,
    /// Maximum canonical tag length, inclusive.
    pub max_length: usize,
    /// Default ratio threshold for [`Normalizer::find_similar`].
    pub similarity_threshold: f64,
    /// Additional per-locale stop words merged with the built-in set.
    pub extra_stop_words: HashSet<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_length: MIN_TAG_LENGTH,
            max_length: MAX_TAG_LENGTH,
            similarity_threshold: SIMILARITY_THRESHOLD,
            extra_stop_words: HashSet::new(),
        }
    }
}

/// Canonicalizes raw tag strings and matches them against existing tags.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with custom configuration.
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw tag into its canonical form.
    ///
    /// Pipeline order is part of the contract:
    /// 1. trim and lowercase
    /// 2. fold diacritics (`ñ` → `n`, combining marks stripped)
    /// 3. replace characters outside `[a-z0-9 _.-]` with a space
    /// 4. collapse separator runs, turn spaces into hyphens, trim `-`/`.`
    /// 5. validate the result
    pub fn normalize(&self, raw: &str) -> Result<String, ValidationError> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(ValidationError::EmptyAfterClean);
        }

        let folded = fold_diacritics(&lowered);
        let cleaned = replace_disallowed(&folded);
        let collapsed = collapse_separators(&cleaned);
        if collapsed.is_empty() {
            return Err(ValidationError::EmptyAfterClean);
        }

        self.validate(&collapsed)?;
        Ok(collapsed)
    }

    /// Validate an already-cleaned tag string.
    ///
    /// Checks, in order: emptiness, length bounds, allowed character class,
    /// digits-only, punctuation-only, and, for single-token tags only,
    /// membership in the stop-word set.
    pub fn validate(&self, tag: &str) -> Result<(), ValidationError> {
        if tag.is_empty() {
            return Err(ValidationError::EmptyAfterClean);
        }
        let length = tag.chars().count();
        if length < self.config.min_length {
            return Err(ValidationError::TooShort {
                min: self.config.min_length,
            });
        }
        if length > self.config.max_length {
            return Err(ValidationError::TooLong {
                max: self.config.max_length,
            });
        }
        if !ALLOWED_CHARS.is_match(tag) {
            return Err(ValidationError::InvalidChars);
        }
        if tag.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NumericOnly);
        }
        if PUNCT_ONLY.is_match(tag) {
            return Err(ValidationError::EmptyAfterClean);
        }
        // Stop words only disqualify single-token tags; "el-salvador" is fine.
        if !tag.contains('-') && self.is_stop_word(tag) {
            return Err(ValidationError::StopWord(tag.to_string()));
        }
        Ok(())
    }

    /// Matching-blocks similarity ratio between two strings, in `[0, 1]`.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        TextDiff::from_chars(a, b).ratio() as f64
    }

    /// Find existing tags whose names are similar to `query`.
    ///
    /// Results are ordered by ratio descending, ties broken by higher
    /// usage count, then name ascending for reproducibility.
    pub fn find_similar(
        &self,
        query: &str,
        candidates: &[SimilarityCandidate],
        threshold: Option<f64>,
    ) -> Vec<SimilarTag> {
        let threshold = threshold.unwrap_or(self.config.similarity_threshold);
        let needle = self.comparison_form(query);

        let mut matches: Vec<SimilarTag> = candidates
            .iter()
            .filter_map(|candidate| {
                let ratio = self.similarity(&needle, &candidate.name.to_lowercase());
                (ratio >= threshold).then(|| SimilarTag {
                    name: candidate.name.clone(),
                    usage_count: candidate.usage_count,
                    ratio,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.ratio
                .partial_cmp(&a.ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.usage_count.cmp(&a.usage_count))
                .then(a.name.cmp(&b.name))
        });
        matches
    }

    /// Best-effort alternatives for a raw (possibly invalid) tag: its
    /// canonical form when valid, the top similar existing tags, and
    /// common misspelling corrections.
    pub fn suggest_alternatives(
        &self,
        raw: &str,
        candidates: &[SimilarityCandidate],
    ) -> Vec<String> {
        let mut suggestions: Vec<String> = Vec::new();

        if let Ok(normalized) = self.normalize(raw) {
            suggestions.push(normalized);
        }

        for similar in self
            .find_similar(raw, candidates, Some(0.6))
            .into_iter()
            .take(3)
        {
            if !suggestions.contains(&similar.name) {
                suggestions.push(similar.name);
            }
        }

        let lowered = raw.to_lowercase();
        for (misspelling, correction) in COMMON_CORRECTIONS {
            if lowered.contains(misspelling) {
                if let Ok(corrected) = self.normalize(&lowered.replace(misspelling, correction)) {
                    if !suggestions.contains(&corrected) {
                        suggestions.push(corrected);
                    }
                }
                break;
            }
        }

        suggestions
    }

    /// Normalize a batch, reporting per-item outcomes without aborting.
    pub fn batch_normalize(&self, inputs: &[String]) -> Vec<BatchNormalization> {
        inputs
            .iter()
            .map(|input| match self.normalize(input) {
                Ok(normalized) => BatchNormalization {
                    input: input.clone(),
                    normalized: Some(normalized),
                    error: None,
                },
                Err(err) => BatchNormalization {
                    input: input.clone(),
                    normalized: None,
                    error: Some(err),
                },
            })
            .collect()
    }

    /// Group inputs that normalize to the same canonical form.
    ///
    /// Returns only groups with more than one member, ordered by canonical
    /// form. Invalid inputs are skipped.
    pub fn detect_duplicates(&self, inputs: &[String]) -> Vec<Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for input in inputs {
            if let Ok(normalized) = self.normalize(input) {
                groups.entry(normalized).or_default().push(input.clone());
            }
        }
        groups
            .into_values()
            .filter(|group| group.len() > 1)
            .collect()
    }

    /// Lowercased, diacritic-folded form used for similarity comparisons.
    fn comparison_form(&self, raw: &str) -> String {
        fold_diacritics(&raw.trim().to_lowercase())
    }

    fn is_stop_word(&self, tag: &str) -> bool {
        STOP_WORDS.contains(tag) || self.config.extra_stop_words.contains(tag)
    }
}

/// Fold accented Latin letters to their base character and drop combining
/// marks left by pre-decomposed input. Anything unmapped falls through to
/// the disallowed-character replacement.
pub(crate) fn fold_diacritics(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => Some('a'),
            'é' | 'è' | 'ê' | 'ë' => Some('e'),
            'í' | 'ì' | 'î' | 'ï' => Some('i'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => Some('o'),
            'ú' | 'ù' | 'û' | 'ü' => Some('u'),
            'ñ' => Some('n'),
            'ç' => Some('c'),
            '\u{0300}'..='\u{036f}' => None,
            _ => Some(c),
        })
        .collect()
}

/// Replace every character outside `[a-z0-9 _.-]` with a space.
fn replace_disallowed(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, ' ' | '_' | '.' | '-') {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Collapse whitespace and separator runs, hyphenate spaces, and trim
/// leading/trailing hyphens and dots.
fn collapse_separators(input: &str) -> String {
    let spaced = WHITESPACE_RUN.replace_all(input, " ");
    let seps = SEPARATOR_RUN.replace_all(&spaced, "-");
    let hyphenated = seps.replace(' ', "-");
    let collapsed = SEPARATOR_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches(|c| c == '-' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new()
    }

    fn candidates(entries: &[(&str, i64)]) -> Vec<SimilarityCandidate> {
        entries
            .iter()
            .map(|(name, usage_count)| SimilarityCandidate {
                name: name.to_string(),
                usage_count: *usage_count,
            })
            .collect()
    }

    #[test]
    fn test_normalize_lowercases() {
        let n = normalizer();
        assert_eq!(n.normalize("PYTHON").unwrap(), "python");
        assert_eq!(n.normalize("JavaScript").unwrap(), "javascript");
    }

    #[test]
    fn test_normalize_trims_and_hyphenates() {
        let n = normalizer();
        assert_eq!(n.normalize("  django  ").unwrap(), "django");
        assert_eq!(n.normalize("web development").unwrap(), "web-development");
    }

    #[test]
    fn test_normalize_folds_diacritics() {
        let n = normalizer();
        assert_eq!(n.normalize("programación").unwrap(), "programacion");
        assert_eq!(n.normalize("análisis").unwrap(), "analisis");
        assert_eq!(n.normalize("diseño").unwrap(), "diseno");
        assert_eq!(n.normalize("español").unwrap(), "espanol");
    }

    #[test]
    fn test_normalize_accented_phrase() {
        let n = normalizer();
        assert_eq!(
            n.normalize("  Programación Web!!").unwrap(),
            "programacion-web"
        );
    }

    #[test]
    fn test_normalize_collapses_separator_runs() {
        let n = normalizer();
        assert_eq!(n.normalize("machine---learning").unwrap(), "machine-learning");
        assert_eq!(n.normalize("web    development").unwrap(), "web-development");
        assert_eq!(n.normalize("web_development").unwrap(), "web-development");
    }

    #[test]
    fn test_normalize_trims_edge_punctuation() {
        let n = normalizer();
        assert_eq!(n.normalize(".python.").unwrap(), "python");
        assert_eq!(n.normalize("-django-").unwrap(), "django");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        for raw in ["  Programación Web!!", "Machine___Learning", "C++ tips"] {
            let once = n.normalize(raw).unwrap();
            let twice = n.normalize(&once).unwrap();
            assert_eq!(once, twice, "normalize not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_validate_length_bounds() {
        let n = normalizer();
        assert_eq!(
            n.validate("a").unwrap_err(),
            ValidationError::TooShort { min: 2 }
        );
        let long = "a".repeat(31);
        assert_eq!(
            n.validate(&long).unwrap_err(),
            ValidationError::TooLong { max: 30 }
        );
        assert!(n.validate("python").is_ok());
    }

    #[test]
    fn test_validate_rejects_stop_words() {
        let n = normalizer();
        assert_eq!(
            n.normalize("el").unwrap_err(),
            ValidationError::StopWord("el".to_string())
        );
        for word in ["que", "muy", "todo", "para"] {
            assert!(matches!(
                n.validate(word),
                Err(ValidationError::StopWord(_))
            ));
        }
    }

    #[test]
    fn test_stop_word_allowed_inside_multi_token() {
        let n = normalizer();
        // "el" alone is a stop word but survives as part of a compound.
        assert_eq!(n.normalize("el salvador").unwrap(), "el-salvador");
    }

    #[test]
    fn test_validate_rejects_numeric_only() {
        let n = normalizer();
        assert_eq!(n.normalize("123").unwrap_err(), ValidationError::NumericOnly);
        assert!(n.normalize("python3").is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_chars() {
        let n = normalizer();
        for tag in ["tag@invalid", "tag#hash", "tag$money"] {
            assert_eq!(n.validate(tag).unwrap_err(), ValidationError::InvalidChars);
        }
    }

    #[test]
    fn test_normalize_rejects_punctuation_only() {
        let n = normalizer();
        assert_eq!(
            n.normalize("---").unwrap_err(),
            ValidationError::EmptyAfterClean
        );
        assert_eq!(
            n.normalize("!!!").unwrap_err(),
            ValidationError::EmptyAfterClean
        );
    }

    #[test]
    fn test_similarity_identical_and_disjoint() {
        let n = normalizer();
        assert!((n.similarity("python", "python") - 1.0).abs() < f64::EPSILON);
        assert!(n.similarity("python", "xylophone-quartet") < 0.5);
    }

    #[test]
    fn test_find_similar_orders_by_ratio() {
        let n = normalizer();
        let pool = candidates(&[("python", 50), ("pytorch", 10), ("rust", 5)]);
        let matches = n.find_similar("pythn", &pool, Some(0.6));
        assert!(!matches.is_empty());
        assert_eq!(matches[0].name, "python");
    }

    #[test]
    fn test_find_similar_ties_broken_by_usage() {
        let n = normalizer();
        // Both names are equidistant from the query; the more-used wins.
        let pool = candidates(&[("testing1", 1), ("testing2", 99)]);
        let matches = n.find_similar("testing", &pool, Some(0.5));
        assert_eq!(matches[0].name, "testing2");
    }

    #[test]
    fn test_suggest_alternatives_includes_correction() {
        let n = normalizer();
        let suggestions = n.suggest_alternatives("javascrip", &[]);
        assert!(suggestions.contains(&"javascrip".to_string()));
        assert!(suggestions.contains(&"javascript".to_string()));
    }

    #[test]
    fn test_suggest_alternatives_for_invalid_input() {
        let n = normalizer();
        let pool = candidates(&[("python", 50)]);
        let suggestions = n.suggest_alternatives("phyton!!", &pool);
        assert!(suggestions.contains(&"python".to_string()));
    }

    #[test]
    fn test_batch_normalize_reports_per_item() {
        let n = normalizer();
        let inputs = vec![
            "Python".to_string(),
            "el".to_string(),
            "Web Development".to_string(),
        ];
        let results = n.batch_normalize(&inputs);
        assert_eq!(results[0].normalized.as_deref(), Some("python"));
        assert!(matches!(
            results[1].error,
            Some(ValidationError::StopWord(_))
        ));
        assert_eq!(results[2].normalized.as_deref(), Some("web-development"));
    }

    #[test]
    fn test_detect_duplicates_groups_by_canonical_form() {
        let n = normalizer();
        let inputs = vec![
            "Python".to_string(),
            "python ".to_string(),
            "PYTHON".to_string(),
            "rust".to_string(),
        ];
        let groups = n.detect_duplicates(&inputs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }
}
