//! Static lexicons backing normalization and keyword extraction.
//!
//! Stop words are Spanish by default (the deployment locale of the source
//! corpus); [`crate::normalize::NormalizerConfig`] accepts additional
//! per-locale sets. The tech-term dictionary and its relation table are
//! locale-independent.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Common words that are rejected as single-token tags.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "el", "la", "de", "en", "y", "a", "que", "es", "se", "no", "te", "lo", "le", "da", "su",
        "por", "son", "con", "para", "al", "del", "los", "las", "un", "una", "este", "esta",
        "esto", "ese", "esa", "eso", "aquel", "aquella", "aquello", "mi", "tu", "nuestro",
        "vuestro", "mio", "tuyo", "suyo", "ser", "estar", "tener", "hacer", "decir", "poder",
        "ir", "ver", "dar", "saber", "querer", "llegar", "pasar", "deber", "poner", "parecer",
        "quedar", "haber", "encontrar", "seguir", "venir", "llevar", "creer", "hablar", "dejar",
        "muy", "todo", "tambien", "ya", "otro", "mucho", "antes", "bien", "donde", "mas",
        "despues", "tanto", "durante", "siempre", "todos", "solo", "hasta", "sobre", "entre",
        "sin", "bajo", "desde", "hacia", "segun",
    ]
    .into_iter()
    .collect()
});

/// Expanded stop-word set for content analysis. Superset of [`STOP_WORDS`]
/// with conjunctions and conjugated auxiliaries that show up in prose but
/// never in tag input.
pub static CONTENT_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut words: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
    words.extend([
        "como", "cuando", "porque", "aunque", "mientras", "sino", "pero", "embargo", "ademas",
        "entonces", "ahora", "aqui", "alli", "asi", "puede", "pueden", "podemos", "podria",
        "podrian", "debe", "deben", "debemos", "tiene", "tienen", "tenemos", "habia", "habian",
        "habiamos", "habra", "habran", "sera", "seran", "seremos", "fue", "fueron", "fuimos",
        "era", "eran", "eramos",
    ]);
    words
});

/// Technical terms that are always good tag candidates. A token in this set
/// bypasses stop-word and frequency filtering and is flagged `is_tech`.
pub static TECH_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Languages
        "python", "javascript", "java", "php", "ruby", "go", "rust", "swift", "kotlin",
        "typescript", "scala", "perl", "matlab", "sql",
        // Frameworks and libraries
        "django", "flask", "fastapi", "react", "vue", "angular", "node", "express", "spring",
        "laravel", "rails", "jquery", "bootstrap", "tailwind",
        // Web
        "html", "css", "sass", "less", "webpack", "babel", "npm", "yarn", "api", "rest",
        "graphql", "json", "xml", "ajax", "cors", "jwt", "oauth",
        // Databases
        "mysql", "postgresql", "mongodb", "redis", "sqlite", "oracle", "nosql", "elasticsearch",
        "cassandra", "dynamodb",
        // DevOps and tooling
        "docker", "kubernetes", "jenkins", "git", "github", "gitlab", "aws", "azure", "gcp",
        "terraform", "ansible", "nginx", "apache", "linux", "ubuntu",
        // Programming concepts
        "algoritmo", "poo", "funcional", "async", "concurrencia", "testing", "tdd", "bdd",
        "refactoring", "debugging", "performance",
        // AI and data
        "machine-learning", "deep-learning", "neural-network", "tensorflow", "pytorch",
        "scikit-learn", "pandas", "numpy", "data-science", "big-data", "analytics",
        // Mobile
        "android", "ios", "flutter", "react-native", "xamarin", "cordova",
        // Other
        "blockchain", "cryptocurrency", "iot", "cybersecurity", "cloud", "microservices",
        "serverless", "containers", "virtualization",
    ]
    .into_iter()
    .collect()
});

/// Technology ecosystem map used to propose adjacent terms that are not
/// literally present in the analyzed text. Slice-ordered for deterministic
/// iteration.
pub static TECH_RELATIONS: &[(&str, &[&str])] = &[
    ("python", &["django", "flask", "fastapi", "pandas", "numpy"]),
    ("javascript", &["react", "vue", "angular", "node", "express"]),
    ("java", &["spring", "hibernate", "maven", "gradle"]),
    ("web", &["html", "css", "javascript", "api", "rest"]),
    ("database", &["sql", "mysql", "postgresql", "mongodb"]),
    ("devops", &["docker", "kubernetes", "jenkins", "git"]),
    ("ai", &["machine-learning", "tensorflow", "pytorch", "data-science"]),
];

/// Common misspelling corrections applied when suggesting alternatives.
pub static COMMON_CORRECTIONS: &[(&str, &str)] = &[
    ("programacion", "programación"),
    ("inteligencia-artifical", "inteligencia-artificial"),
    ("javascrip", "javascript"),
    ("phyton", "python"),
    ("databse", "database"),
    ("machien-learning", "machine-learning"),
    ("web-developement", "web-development"),
    ("fronted", "frontend"),
    ("backed", "backend"),
];

/// Category keyword table for content-based recommendation. A category's
/// score is the number of its keywords present in the content.
pub static CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "programacion",
        &["codigo", "programar", "desarrollo", "software", "algoritmo"],
    ),
    ("web", &["html", "css", "javascript", "frontend", "backend", "api"]),
    ("base-de-datos", &["sql", "database", "datos", "consulta", "tabla"]),
    (
        "devops",
        &["docker", "kubernetes", "deployment", "servidor", "infraestructura"],
    ),
    ("movil", &["android", "ios", "app", "movil", "aplicacion"]),
    ("ia", &["inteligencia", "artificial", "machine", "learning", "neural"]),
];

/// Heuristic category for a tag name, from the category keyword table and
/// the tech-term dictionary. Used by the backfill job.
pub fn categorize(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return Some(category);
        }
    }
    if TECH_TERMS.contains(lowered.as_str()) {
        return Some("tecnologia");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_contains_articles() {
        assert!(STOP_WORDS.contains("el"));
        assert!(STOP_WORDS.contains("la"));
        assert!(!STOP_WORDS.contains("python"));
    }

    #[test]
    fn test_content_stop_words_superset() {
        for word in STOP_WORDS.iter() {
            assert!(CONTENT_STOP_WORDS.contains(word), "missing {}", word);
        }
        assert!(CONTENT_STOP_WORDS.contains("porque"));
    }

    #[test]
    fn test_tech_terms() {
        assert!(TECH_TERMS.contains("rust"));
        assert!(TECH_TERMS.contains("machine-learning"));
    }

    #[test]
    fn test_categorize_by_keyword() {
        assert_eq!(categorize("consulta-sql"), Some("base-de-datos"));
        assert_eq!(categorize("docker"), Some("devops"));
        assert_eq!(categorize("rust"), Some("tecnologia"));
        assert_eq!(categorize("cocina"), None);
    }
}
