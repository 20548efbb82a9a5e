//! Synonym redirect repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use taxo_core::{new_v7, Error, Result, SynonymRepository, Tag, TagSynonym};

/// PostgreSQL implementation of [`SynonymRepository`].
#[derive(Clone)]
pub struct PgSynonymRepository {
    pool: Pool<Postgres>,
}

impl PgSynonymRepository {
    /// Create a new PgSynonymRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a synonym redirect inside an open transaction (merge path).
    ///
    /// Rejected with [`Error::Conflict`] before any write when the text
    /// equals the main tag's own name, an active synonym for the text
    /// already points elsewhere, or a live tag already carries the name.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        main_tag_id: Uuid,
        main_tag_name: &str,
        synonym_text: &str,
        created_by: Option<&str>,
    ) -> Result<TagSynonym> {
        if synonym_text.eq_ignore_ascii_case(main_tag_name) {
            return Err(Error::Conflict(
                "synonym cannot equal its main tag".to_string(),
            ));
        }

        let existing = sqlx::query(
            "SELECT main_tag_id FROM tag_synonym WHERE LOWER(synonym_text) = LOWER($1) AND is_active",
        )
        .bind(synonym_text)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;
        if let Some(row) = existing {
            let main: Uuid = row.get("main_tag_id");
            if main != main_tag_id {
                return Err(Error::Conflict(format!(
                    "synonym '{}' already redirects to another tag",
                    synonym_text
                )));
            }
        }

        let shadowed = sqlx::query("SELECT id FROM tag WHERE LOWER(name) = LOWER($1)")
            .bind(synonym_text)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        if shadowed.is_some() {
            return Err(Error::Conflict(format!(
                "a tag named '{}' already exists",
                synonym_text
            )));
        }

        let synonym = TagSynonym {
            id: new_v7(),
            main_tag_id,
            synonym_text: synonym_text.to_string(),
            is_active: true,
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO tag_synonym (id, main_tag_id, synonym_text, is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(synonym.id)
        .bind(synonym.main_tag_id)
        .bind(&synonym.synonym_text)
        .bind(synonym.is_active)
        .bind(&synonym.created_by)
        .bind(synonym.created_at)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(synonym)
    }

    /// Re-point every synonym of `source` to `target` (merge path).
    pub async fn repoint_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source: Uuid,
        target: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE tag_synonym SET main_tag_id = $2 WHERE main_tag_id = $1")
            .bind(source)
            .bind(target)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl SynonymRepository for PgSynonymRepository {
    async fn resolve(&self, text: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            SELECT t.id, t.name, t.created_at
            FROM tag_synonym s
            JOIN tag t ON t.id = s.main_tag_id
            WHERE LOWER(s.synonym_text) = LOWER($1) AND s.is_active
            "#,
        )
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Tag {
            id: r.get("id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
        }))
    }

    async fn for_tag(&self, tag_id: Uuid) -> Result<Vec<TagSynonym>> {
        let rows = sqlx::query(
            r#"
            SELECT id, main_tag_id, synonym_text, is_active, created_by, created_at
            FROM tag_synonym
            WHERE main_tag_id = $1 AND is_active
            ORDER BY synonym_text
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| TagSynonym {
                id: r.get("id"),
                main_tag_id: r.get("main_tag_id"),
                synonym_text: r.get("synonym_text"),
                is_active: r.get("is_active"),
                created_by: r.get("created_by"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
