//! # taxo-db
//!
//! PostgreSQL database layer for the taxo tag engine.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all tag entities
//! - Transaction-aware (`_tx`) variants of every mutation that
//!   participates in a composed transaction script
//!
//! ## Example
//!
//! ```rust,ignore
//! use taxo_db::Database;
//! use taxo_core::TagRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/taxo").await?;
//!
//!     let (tag, created) = db.tags.create_or_get("rust", Some("ana")).await?;
//!     println!("{} (created: {})", tag.name, created);
//!     Ok(())
//! }
//! ```

pub mod cooccurrence;
pub mod documents;
pub mod history;
pub mod pool;
pub mod synonyms;
pub mod tags;

#[cfg(test)]
mod tests;

// Test fixtures for integration tests
// Note: Always compiled so integration tests can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use taxo_core::*;

// Re-export repository implementations
pub use cooccurrence::PgCooccurrenceRepository;
pub use documents::PgDocumentTagRepository;
pub use history::PgUsageHistoryRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use synonyms::PgSynonymRepository;
pub use tags::PgTagRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Tag and metadata repository.
    pub tags: PgTagRepository,
    /// Synonym redirect repository.
    pub synonyms: PgSynonymRepository,
    /// Cooccurrence graph repository.
    pub cooccurrence: PgCooccurrenceRepository,
    /// Append-only usage history repository.
    pub history: PgUsageHistoryRepository,
    /// Document↔tag association repository.
    pub documents: PgDocumentTagRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            synonyms: PgSynonymRepository::new(pool.clone()),
            cooccurrence: PgCooccurrenceRepository::new(pool.clone()),
            history: PgUsageHistoryRepository::new(pool.clone()),
            documents: PgDocumentTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect to the test database (for integration tests).
    #[cfg(test)]
    pub async fn connect_test() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| crate::test_fixtures::DEFAULT_TEST_DATABASE_URL.to_string());
        Self::connect(&database_url).await
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod escape_tests {
    use super::escape_like;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
