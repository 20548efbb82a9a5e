//! Cooccurrence graph repository implementation.
//!
//! Edges are undirected, keyed by the ordered uuid pair `tag1_id < tag2_id`.
//! The graph is append-only: counts grow when documents are tagged and are
//! never decremented when documents are deleted, so edges reflect
//! historical usage rather than the live document set.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use taxo_core::{CooccurrenceRepository, Error, RelatedTag, Result};

/// PostgreSQL implementation of [`CooccurrenceRepository`].
#[derive(Clone)]
pub struct PgCooccurrenceRepository {
    pool: Pool<Postgres>,
}

impl PgCooccurrenceRepository {
    /// Create a new PgCooccurrenceRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert an edge for every unordered pair in a document's resolved
    /// tag set, then recompute strengths from current usage counts.
    ///
    /// Must run in the same transaction as the usage increments so the
    /// graph and the per-tag counters never diverge; the caller increments
    /// usage first so strength sees the fresh counts.
    pub async fn update_from_document_tags_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_ids: &[Uuid],
    ) -> Result<()> {
        let mut ids: Vec<Uuid> = tag_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.len() < 2 {
            return Ok(());
        }

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                sqlx::query(
                    r#"
                    INSERT INTO tag_cooccurrence (tag1_id, tag2_id, count, strength, last_updated)
                    VALUES ($1, $2, 1, 0.0, now())
                    ON CONFLICT (tag1_id, tag2_id)
                    DO UPDATE SET count = tag_cooccurrence.count + 1, last_updated = now()
                    "#,
                )
                .bind(ids[i])
                .bind(ids[j])
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
            }
        }

        self.recompute_strengths_tx(tx, &ids).await
    }

    /// Recompute `strength = min(count / sqrt(usage1 * usage2), 1)` for
    /// every edge whose endpoints are both in `ids`.
    async fn recompute_strengths_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[Uuid],
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tag_cooccurrence c
            SET strength = LEAST(
                c.count::float8
                / sqrt(GREATEST(m1.usage_count, 1)::float8 * GREATEST(m2.usage_count, 1)::float8),
                1.0
            )
            FROM tag_metadata m1, tag_metadata m2
            WHERE m1.tag_id = c.tag1_id
              AND m2.tag_id = c.tag2_id
              AND c.tag1_id = ANY($1)
              AND c.tag2_id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Pool-level variant of [`Self::update_from_document_tags_tx`] that
    /// opens its own transaction (backfill path).
    pub async fn update_from_document_tags(&self, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_from_document_tags_tx(&mut tx, tag_ids).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    /// Drop every edge. Only the backfill job calls this, right before it
    /// rebuilds the graph from the document links.
    pub async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM tag_cooccurrence")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Fold every edge touching `source` onto `target` (merge path).
    ///
    /// Counts are summed where the re-pointed edge already exists; the
    /// direct (source, target) edge is dropped rather than becoming a
    /// self-edge. Strengths of the surviving edges are recomputed after
    /// the caller has transferred usage counts.
    pub async fn fold_into_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: Uuid,
        target: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tag_cooccurrence (tag1_id, tag2_id, count, strength, last_updated)
            SELECT LEAST(x.other, $2), GREATEST(x.other, $2), x.count, x.strength, now()
            FROM (
                SELECT CASE WHEN tag1_id = $1 THEN tag2_id ELSE tag1_id END AS other,
                       count, strength
                FROM tag_cooccurrence
                WHERE tag1_id = $1 OR tag2_id = $1
            ) x
            WHERE x.other <> $2
            ON CONFLICT (tag1_id, tag2_id)
            DO UPDATE SET count = tag_cooccurrence.count + EXCLUDED.count,
                          last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(source)
        .bind(target)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("DELETE FROM tag_cooccurrence WHERE tag1_id = $1 OR tag2_id = $1")
            .bind(source)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }

    /// Recompute strengths of every edge touching `tag_id` (merge path,
    /// after usage counts were transferred).
    pub async fn recompute_for_tag_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tag_cooccurrence c
            SET strength = LEAST(
                c.count::float8
                / sqrt(GREATEST(m1.usage_count, 1)::float8 * GREATEST(m2.usage_count, 1)::float8),
                1.0
            )
            FROM tag_metadata m1, tag_metadata m2
            WHERE m1.tag_id = c.tag1_id
              AND m2.tag_id = c.tag2_id
              AND (c.tag1_id = $1 OR c.tag2_id = $1)
            "#,
        )
        .bind(tag_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl CooccurrenceRepository for PgCooccurrenceRepository {
    async fn related(
        &self,
        tag_id: Uuid,
        limit: i64,
        min_strength: f64,
    ) -> Result<Vec<RelatedTag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, c.strength, c.count
            FROM tag_cooccurrence c
            JOIN tag t
              ON t.id = CASE WHEN c.tag1_id = $1 THEN c.tag2_id ELSE c.tag1_id END
            WHERE (c.tag1_id = $1 OR c.tag2_id = $1) AND c.strength >= $2
            ORDER BY c.strength DESC, c.count DESC, t.name ASC
            LIMIT $3
            "#,
        )
        .bind(tag_id)
        .bind(min_strength)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| RelatedTag {
                id: r.get("id"),
                name: r.get("name"),
                strength: r.get("strength"),
                count: r.get("count"),
            })
            .collect())
    }

    async fn edge(&self, a: Uuid, b: Uuid) -> Result<Option<(i64, f64)>> {
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let row = sqlx::query(
            "SELECT count, strength FROM tag_cooccurrence WHERE tag1_id = $1 AND tag2_id = $2",
        )
        .bind(first)
        .bind(second)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.map(|r| (r.get("count"), r.get("strength"))))
    }
}
