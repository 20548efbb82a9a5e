//! Usage history repository implementation.
//!
//! The history table is append-only: rows are inserted when documents are
//! tagged and only ever removed in bulk by cleanup. Trending windows and
//! per-actor signals are reconstructed from it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use taxo_core::{new_v7, Error, Result, Tag, UsageHistoryRepository};

/// PostgreSQL implementation of [`UsageHistoryRepository`].
#[derive(Clone)]
pub struct PgUsageHistoryRepository {
    pool: Pool<Postgres>,
}

impl PgUsageHistoryRepository {
    /// Create a new PgUsageHistoryRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one usage row inside an open transaction.
    pub async fn record_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        document_id: Uuid,
        actor: Option<&str>,
        used_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tag_usage_history (id, tag_id, document_id, actor, used_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(new_v7())
        .bind(tag_id)
        .bind(document_id)
        .bind(actor)
        .bind(used_at)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Pool-level append (backfill path).
    pub async fn record(
        &self,
        tag_id: Uuid,
        document_id: Uuid,
        actor: Option<&str>,
        used_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.record_tx(&mut tx, tag_id, document_id, actor, used_at)
            .await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    /// Whether any history row exists for a (tag, document) pair.
    pub async fn exists(&self, tag_id: Uuid, document_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM tag_usage_history WHERE tag_id = $1 AND document_id = $2 LIMIT 1",
        )
        .bind(tag_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.is_some())
    }

    /// Re-point every history row of `source` to `target` (merge path).
    pub async fn repoint_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: Uuid,
        target: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE tag_usage_history SET tag_id = $2 WHERE tag_id = $1")
            .bind(source)
            .bind(target)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl UsageHistoryRepository for PgUsageHistoryRepository {
    async fn window_counts(&self, since: DateTime<Utc>) -> Result<Vec<(Uuid, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT tag_id, COUNT(*) AS uses
            FROM tag_usage_history
            WHERE used_at >= $1
            GROUP BY tag_id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get("tag_id"), r.get("uses")))
            .collect())
    }

    async fn top_for_actor(&self, actor: &str, limit: i64) -> Result<Vec<(Tag, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at, COUNT(*) AS uses
            FROM tag_usage_history h
            JOIN tag t ON t.id = h.tag_id
            WHERE h.actor = $1
            GROUP BY t.id, t.name, t.created_at
            ORDER BY uses DESC, t.name ASC
            LIMIT $2
            "#,
        )
        .bind(actor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    Tag {
                        id: r.get("id"),
                        name: r.get("name"),
                        created_at: r.get("created_at"),
                    },
                    r.get("uses"),
                )
            })
            .collect())
    }

    async fn count_for_tag(&self, tag_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS uses FROM tag_usage_history WHERE tag_id = $1")
            .bind(tag_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.get("uses"))
    }
}
