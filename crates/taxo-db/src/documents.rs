//! Document↔tag association repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use taxo_core::{DocumentTagRepository, Error, Result, Tag};

/// PostgreSQL implementation of [`DocumentTagRepository`].
#[derive(Clone)]
pub struct PgDocumentTagRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentTagRepository {
    /// Create a new PgDocumentTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Link a tag to a document inside an open transaction. Idempotent.
    pub async fn link_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
        tag_id: Uuid,
        tagged_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document_tag (document_id, tag_id, tagged_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (document_id, tag_id) DO NOTHING
            "#,
        )
        .bind(document_id)
        .bind(tag_id)
        .bind(tagged_at)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Every link with its tagging timestamp (backfill path).
    pub async fn all_links_with_time(&self) -> Result<Vec<(Uuid, Uuid, DateTime<Utc>)>> {
        let rows = sqlx::query(
            "SELECT document_id, tag_id, tagged_at FROM document_tag ORDER BY document_id, tag_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get("document_id"), r.get("tag_id"), r.get("tagged_at")))
            .collect())
    }

    /// Re-point document links from `source` to `target` (merge path),
    /// collapsing links on documents that already carry the target tag.
    pub async fn repoint_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: Uuid,
        target: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE document_tag d
            SET tag_id = $2
            WHERE d.tag_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM document_tag d2
                  WHERE d2.document_id = d.document_id AND d2.tag_id = $2
              )
            "#,
        )
        .bind(source)
        .bind(target)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("DELETE FROM document_tag WHERE tag_id = $1")
            .bind(source)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentTagRepository for PgDocumentTagRepository {
    async fn tags_for_document(&self, document_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM document_tag d
            JOIN tag t ON t.id = d.tag_id
            WHERE d.document_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Tag {
                id: r.get("id"),
                name: r.get("name"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn document_count_for_tag(&self, tag_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS links FROM document_tag WHERE tag_id = $1")
            .bind(tag_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("links"))
    }

    async fn all_links(&self) -> Result<Vec<(Uuid, Uuid)>> {
        let rows = sqlx::query(
            "SELECT document_id, tag_id FROM document_tag ORDER BY document_id, tag_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get("document_id"), r.get("tag_id")))
            .collect())
    }
}
