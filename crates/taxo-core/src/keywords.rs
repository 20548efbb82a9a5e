//! Keyword extraction from document content.
//!
//! Mines a title + HTML body pair for tag candidates using term frequency,
//! title position, and the technical-term dictionary. Pure computation: no
//! store access, no network, no model calls.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{MAX_KEYWORDS, MAX_WORD_LENGTH, MIN_KEYWORD_FREQUENCY, MIN_WORD_LENGTH};
use crate::lexicon::{CONTENT_STOP_WORDS, TECH_RELATIONS, TECH_TERMS};
use crate::models::ScoredKeyword;
use crate::normalize::Normalizer;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
// Hyphenated compounds stay whole so dictionary entries like
// "machine-learning" can match a single token.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9_]+(?:-[a-z0-9_]+)*").unwrap());

/// Extractor configuration.
#[derive(Debug, Clone)]
pub struct KeywordExtractorConfig {
    pub min_word_length: usize,
    pub max_word_length: usize,
    /// Minimum combined frequency for non-tech, non-title candidates.
    pub min_frequency: usize,
    /// Maximum keywords returned by [`KeywordExtractor::extract`].
    pub max_keywords: usize,
}

impl Default for KeywordExtractorConfig {
    fn default() -> Self {
        Self {
            min_word_length: MIN_WORD_LENGTH,
            max_word_length: MAX_WORD_LENGTH,
            min_frequency: MIN_KEYWORD_FREQUENCY,
            max_keywords: MAX_KEYWORDS,
        }
    }
}

/// Frequency/position/dictionary keyword miner.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    config: KeywordExtractorConfig,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KeywordExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract scored keyword candidates from a title and an HTML body.
    ///
    /// Candidates survive when their combined frequency reaches the
    /// configured minimum, they appear in the title, or they are recognized
    /// technical terms. Output is ranked by score descending, ties broken
    /// by keyword ascending, truncated to `max_keywords`.
    pub fn extract(&self, title: &str, body_html: &str) -> Vec<ScoredKeyword> {
        let title_tokens = self.tokenize(&clean_text(title));
        let body_tokens = self.tokenize(&clean_text(&strip_html(body_html)));
        let total_words = body_tokens.len();

        let mut title_freq: HashMap<&str, usize> = HashMap::new();
        for token in &title_tokens {
            *title_freq.entry(token.as_str()).or_insert(0) += 1;
        }
        let mut body_freq: HashMap<&str, usize> = HashMap::new();
        for token in &body_tokens {
            *body_freq.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut keywords: Vec<ScoredKeyword> = Vec::new();

        for (word, in_title) in title_freq
            .keys()
            .map(|w| (*w, true))
            .chain(body_freq.keys().map(|w| (*w, false)))
        {
            if !seen.insert(word) || !self.is_valid_keyword(word) {
                continue;
            }
            let in_title = in_title || title_freq.contains_key(word);
            let freq_in_body = body_freq.get(word).copied().unwrap_or(0);
            let frequency = freq_in_body + title_freq.get(word).copied().unwrap_or(0);
            let is_tech = TECH_TERMS.contains(word);

            if frequency < self.config.min_frequency && !is_tech && !in_title {
                continue;
            }

            keywords.push(ScoredKeyword {
                keyword: word.to_string(),
                score: score_keyword(word, freq_in_body, total_words, in_title, is_tech),
                frequency,
                in_title,
                is_tech,
            });
        }

        keywords.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.keyword.cmp(&b.keyword))
        });
        keywords.truncate(self.config.max_keywords);
        keywords
    }

    /// Keyword candidates from the title alone, in order of appearance.
    pub fn extract_from_title(&self, title: &str) -> Vec<String> {
        self.tokenize(&clean_text(title))
            .into_iter()
            .filter(|word| self.is_valid_keyword(word))
            .collect()
    }

    /// Turn keywords into tag suggestions that converge on the existing
    /// taxonomy: each keyword is normalized, and when `existing` (a
    /// lowercased-name → canonical-name map) already contains it, the
    /// existing canonical spelling is substituted.
    pub fn suggest_tags_from_keywords(
        &self,
        keywords: &[String],
        existing: &HashMap<String, String>,
        normalizer: &Normalizer,
    ) -> Vec<String> {
        let mut suggestions: Vec<String> = Vec::new();
        for keyword in keywords {
            let Ok(normalized) = normalizer.normalize(keyword) else {
                continue;
            };
            let suggestion = existing
                .get(&normalized)
                .cloned()
                .unwrap_or(normalized);
            if !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }
        suggestions
    }

    /// Adjacent technology terms from the static ecosystem table, skipping
    /// terms already present in `keywords`, capped at five.
    pub fn related_tech_terms(&self, keywords: &[String]) -> Vec<String> {
        let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let present: HashSet<&str> = lowered.iter().map(String::as_str).collect();
        let mut related: Vec<String> = Vec::new();

        let push = |term: &str, related: &mut Vec<String>| {
            if !present.contains(term) && !related.iter().any(|r| r == term) {
                related.push(term.to_string());
            }
        };

        for keyword in &lowered {
            if let Some((_, terms)) = TECH_RELATIONS.iter().find(|(k, _)| *k == keyword.as_str()) {
                for term in *terms {
                    push(term, &mut related);
                }
            }
            // Reverse lookup: a member term pulls in its ecosystem.
            for (category, terms) in TECH_RELATIONS {
                if terms.contains(&keyword.as_str()) {
                    push(category, &mut related);
                    for term in *terms {
                        push(term, &mut related);
                    }
                }
            }
        }

        related.truncate(5);
        related
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        WORD.find_iter(text)
            .map(|m| m.as_str().to_string())
            .filter(|w| {
                let len = w.chars().count();
                len >= self.config.min_word_length && len <= self.config.max_word_length
            })
            .collect()
    }

    fn is_valid_keyword(&self, word: &str) -> bool {
        let len = word.chars().count();
        if len < self.config.min_word_length || len > self.config.max_word_length {
            return false;
        }
        if TECH_TERMS.contains(word) {
            return true;
        }
        if CONTENT_STOP_WORDS.contains(word) {
            return false;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        word.chars().any(|c| c.is_ascii_alphabetic())
    }
}

/// Blend the scoring signals for one keyword, clamped to `[0, 1]`.
///
/// Signals: body term frequency (weight 0.3), flat title bonus (0.4), tech
/// dictionary bonus (0.3), capped raw-frequency bonus (≤ 0.2), a length
/// sweet spot (4–8 chars +0.1, >15 −0.1), and a boilerplate penalty (−0.1)
/// when the term exceeds 5% of body tokens.
pub fn score_keyword(
    keyword: &str,
    freq_in_body: usize,
    total_words: usize,
    in_title: bool,
    is_tech: bool,
) -> f64 {
    let mut score = 0.0;

    if total_words > 0 {
        score += freq_in_body as f64 / total_words as f64 * 0.3;
    }
    if in_title {
        score += 0.4;
    }
    if is_tech {
        score += 0.3;
    }
    score += (freq_in_body as f64 / 10.0).min(0.2);

    let length = keyword.chars().count();
    if (4..=8).contains(&length) {
        score += 0.1;
    } else if length > 15 {
        score -= 0.1;
    }

    if total_words > 0 && freq_in_body as f64 > total_words as f64 * 0.05 {
        score -= 0.1;
    }

    score.clamp(0.0, 1.0)
}

fn strip_html(html: &str) -> String {
    let stripped = HTML_TAG.replace_all(html, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Lowercase, fold diacritics (matching what the normalizer does to tag
/// names), and replace everything outside word chars, whitespace, and
/// hyphens with spaces.
fn clean_text(text: &str) -> String {
    let folded = crate::normalize::fold_diacritics(&text.to_lowercase());
    let replaced: String = folded
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new()
    }

    #[test]
    fn test_extract_flags_tech_terms() {
        let kws = extractor().extract(
            "Django tips",
            "<p>Building APIs with django and flask.</p>",
        );
        let django = kws.iter().find(|k| k.keyword == "django").unwrap();
        assert!(django.is_tech);
        assert!(django.in_title);
        let flask = kws.iter().find(|k| k.keyword == "flask").unwrap();
        assert!(flask.is_tech);
        assert!(!flask.in_title);
    }

    #[test]
    fn test_title_bonus_outranks_body_only() {
        let kws = extractor().extract(
            "Django tips",
            "<p>Building APIs with django and flask.</p>",
        );
        let django_pos = kws.iter().position(|k| k.keyword == "django").unwrap();
        let flask_pos = kws.iter().position(|k| k.keyword == "flask").unwrap();
        assert!(django_pos < flask_pos);
    }

    #[test]
    fn test_extract_strips_html() {
        let kws = extractor().extract("", "<script>python</script><div class=\"wide\">rust</div>");
        assert!(kws.iter().any(|k| k.keyword == "python"));
        assert!(kws.iter().any(|k| k.keyword == "rust"));
        assert!(!kws.iter().any(|k| k.keyword == "script" || k.keyword == "div"));
    }

    #[test]
    fn test_extract_drops_numeric_and_short_tokens() {
        let kws = extractor().extract("2024 go", "1234 1234 ab ab cd cd");
        assert!(kws.is_empty());
    }

    #[test]
    fn test_extract_requires_min_frequency_for_plain_words() {
        // "servidor" appears once, is not tech and not in the title.
        let kws = extractor().extract("", "un servidor rapido");
        assert!(!kws.iter().any(|k| k.keyword == "servidor"));

        let kws = extractor().extract("", "servidor lento servidor rapido");
        assert!(kws.iter().any(|k| k.keyword == "servidor"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let ext = extractor();
        let body = "rust tooling with cargo and rust macros for testing";
        let first = ext.extract("Rust testing", body);
        for _ in 0..5 {
            assert_eq!(ext.extract("Rust testing", body), first);
        }
    }

    #[test]
    fn test_score_keyword_clamped() {
        let score = score_keyword("python", 100, 100, true, true);
        assert!(score <= 1.0);
        let score = score_keyword("x", 0, 0, false, false);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_score_keyword_length_sweet_spot() {
        let short = score_keyword("api1", 1, 100, false, false);
        let long = score_keyword("a-very-long-keyword", 1, 100, false, false);
        assert!(short > long);
    }

    #[test]
    fn test_boilerplate_penalty() {
        // 10 of 100 tokens is above the 5% ceiling.
        let common = score_keyword("plantilla", 10, 100, false, false);
        let rare = score_keyword("plantilla", 4, 100, false, false);
        assert!(rare >= common);
    }

    #[test]
    fn test_extract_from_title() {
        let words = extractor().extract_from_title("Aprende Python y Django");
        assert_eq!(words, vec!["aprende", "python", "django"]);
    }

    #[test]
    fn test_suggest_tags_prefers_existing_spelling() {
        let normalizer = Normalizer::new();
        let mut existing = HashMap::new();
        existing.insert("web-development".to_string(), "web-development".to_string());
        let suggestions = extractor().suggest_tags_from_keywords(
            &["Web Development".to_string(), "rustlang".to_string()],
            &existing,
            &normalizer,
        );
        assert_eq!(suggestions[0], "web-development");
        assert!(suggestions.contains(&"rustlang".to_string()));
    }

    #[test]
    fn test_related_tech_terms_expands_ecosystem() {
        let related = extractor().related_tech_terms(&["python".to_string()]);
        assert!(related.contains(&"django".to_string()));
        assert!(!related.contains(&"python".to_string()));
        assert!(related.len() <= 5);
    }

    #[test]
    fn test_related_tech_terms_reverse_lookup() {
        let related = extractor().related_tech_terms(&["django".to_string()]);
        assert!(related.contains(&"python".to_string()));
        assert!(!related.contains(&"django".to_string()));
    }
}
