//! Tag and metadata repository implementation.
//!
//! Tags and their metadata rows are 1:1 and managed together: every path
//! that creates a tag guarantees a metadata row exists before it returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use taxo_core::{
    new_v7, Error, Result, SimilarityCandidate, Tag, TagMetadata, TagRepository, TagSummary,
};

use crate::escape_like;

const SUMMARY_COLUMNS: &str = r#"
    t.id, t.name, m.usage_count, m.trending_score, m.is_trending, m.category
"#;

/// PostgreSQL implementation of [`TagRepository`].
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get or create a tag inside an open transaction.
    ///
    /// Same contract as [`TagRepository::create_or_get`]; used by the
    /// document-tagging transaction script.
    pub async fn create_or_get_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        created_by: Option<&str>,
    ) -> Result<(Tag, bool)> {
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO tag (id, name, created_at) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(new_v7())
        .bind(name)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        let created = inserted.rows_affected() > 0;

        let row = sqlx::query("SELECT id, name, created_at FROM tag WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)?;
        let tag = row_to_tag(&row);

        sqlx::query(
            r#"
            INSERT INTO tag_metadata (tag_id, created_by, created_at, last_used, updated_at)
            VALUES ($1, $2, $3, $3, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(tag.id)
        .bind(created_by)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok((tag, created))
    }

    /// Increment a tag's usage counter and touch `last_used`.
    ///
    /// The in-place arithmetic serializes concurrent writers on the
    /// metadata row, so no increment is ever lost.
    pub async fn increment_usage_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tag_metadata
            SET usage_count = usage_count + 1, last_used = $2, updated_at = $2
            WHERE tag_id = $1
            "#,
        )
        .bind(tag_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Add `amount` to a tag's usage counter (merge path).
    pub async fn add_usage_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        amount: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tag_metadata
            SET usage_count = usage_count + $2, updated_at = now()
            WHERE tag_id = $1
            "#,
        )
        .bind(tag_id)
        .bind(amount)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete a tag inside an open transaction; dependent rows cascade.
    pub async fn delete_tx(&self, tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Set a tag's heuristic category (backfill job).
    pub async fn set_category(&self, tag_id: Uuid, category: Option<&str>) -> Result<()> {
        sqlx::query(
            "UPDATE tag_metadata SET category = $2, updated_at = now() WHERE tag_id = $1",
        )
        .bind(tag_id)
        .bind(category)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Overwrite a tag's usage counter from recomputed totals (backfill job).
    pub async fn set_usage_count(&self, tag_id: Uuid, usage_count: i64) -> Result<()> {
        sqlx::query(
            "UPDATE tag_metadata SET usage_count = $2, updated_at = now() WHERE tag_id = $1",
        )
        .bind(tag_id)
        .bind(usage_count)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create_or_get(&self, name: &str, created_by: Option<&str>) -> Result<(Tag, bool)> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.create_or_get_tx(&mut tx, name, created_by).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, created_at FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(|r| row_to_tag(&r)))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, created_at FROM tag WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(|r| row_to_tag(&r)))
    }

    async fn metadata(&self, tag_id: Uuid) -> Result<Option<TagMetadata>> {
        let row = sqlx::query(
            r#"
            SELECT tag_id, usage_count, trending_score, category, is_approved,
                   is_trending, created_by, created_at, last_used, updated_at
            FROM tag_metadata
            WHERE tag_id = $1
            "#,
        )
        .bind(tag_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| TagMetadata {
            tag_id: r.get("tag_id"),
            usage_count: r.get("usage_count"),
            trending_score: r.get("trending_score"),
            category: r.get("category"),
            is_approved: r.get("is_approved"),
            is_trending: r.get("is_trending"),
            created_by: r.get("created_by"),
            created_at: r.get("created_at"),
            last_used: r.get("last_used"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn popular(&self, limit: i64, category: Option<&str>) -> Result<Vec<TagSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM tag t
            JOIN tag_metadata m ON m.tag_id = t.id
            WHERE m.is_approved AND ($2::text IS NULL OR m.category = $2)
            ORDER BY m.usage_count DESC, t.name ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_summary).collect())
    }

    async fn trending(&self, limit: i64) -> Result<Vec<TagSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM tag t
            JOIN tag_metadata m ON m.tag_id = t.id
            WHERE m.is_trending
            ORDER BY m.trending_score DESC, t.name ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_summary).collect())
    }

    async fn search_substring(&self, query: &str, limit: i64) -> Result<Vec<TagSummary>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM tag t
            JOIN tag_metadata m ON m.tag_id = t.id
            WHERE t.name ILIKE $1
            ORDER BY m.usage_count DESC, t.name ASC
            LIMIT $2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_summary).collect())
    }

    async fn similarity_snapshot(&self) -> Result<Vec<SimilarityCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT t.name, m.usage_count
            FROM tag t
            JOIN tag_metadata m ON m.tag_id = t.id
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| SimilarityCandidate {
                name: r.get("name"),
                usage_count: r.get("usage_count"),
            })
            .collect())
    }

    async fn usage_snapshot(&self) -> Result<Vec<(Uuid, i64)>> {
        let rows = sqlx::query("SELECT tag_id, usage_count FROM tag_metadata")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get("tag_id"), r.get("usage_count")))
            .collect())
    }

    async fn apply_trending(&self, scores: &[(Uuid, f64)], trending_ids: &[Uuid]) -> Result<()> {
        let (ids, values): (Vec<Uuid>, Vec<f64>) = scores.iter().copied().unzip();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"
            UPDATE tag_metadata m
            SET trending_score = s.score, updated_at = now()
            FROM (SELECT UNNEST($1::uuid[]) AS tag_id, UNNEST($2::float8[]) AS score) s
            WHERE m.tag_id = s.tag_id
            "#,
        )
        .bind(&ids)
        .bind(&values)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("UPDATE tag_metadata SET is_trending = FALSE WHERE is_trending")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("UPDATE tag_metadata SET is_trending = TRUE WHERE tag_id = ANY($1)")
            .bind(trending_ids)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn unused_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT tag_id FROM tag_metadata WHERE usage_count = 0 AND last_used < $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(|r| r.get("tag_id")).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

fn row_to_tag(row: &sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn row_to_summary(row: &sqlx::postgres::PgRow) -> TagSummary {
    TagSummary {
        id: row.get("id"),
        name: row.get("name"),
        usage_count: row.get("usage_count"),
        trending_score: row.get("trending_score"),
        is_trending: row.get("is_trending"),
        category: row.get("category"),
    }
}
