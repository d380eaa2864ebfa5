//! Note Repository Implementation
//!
//! PostgreSQL implementation of the NoteRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Note, NoteCategory, NoteRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct NoteRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    category: String,
    is_pinned: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl NoteRow {
    fn into_note(self) -> Note {
        Note {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            // Unknown names can only come from manual edits; treat them as personal.
            category: self.category.parse().unwrap_or(NoteCategory::Personal),
            is_pinned: self.is_pinned,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            deleted_by: self.deleted_by,
        }
    }
}

/// PostgreSQL note repository implementation.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, AppError> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, user_id, title, content, category, is_pinned, created_at, created_by,
                   updated_at, updated_by, is_deleted, deleted_at, deleted_by
            FROM notes
            WHERE id = $1 AND user_id = $2 AND NOT is_deleted
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_note()))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>, AppError> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, user_id, title, content, category, is_pinned, created_at, created_by,
                   updated_at, updated_by, is_deleted, deleted_at, deleted_by
            FROM notes
            WHERE user_id = $1 AND NOT is_deleted
            ORDER BY is_pinned DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_note()).collect())
    }

    async fn create(&self, note: &Note) -> Result<Note, AppError> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (id, user_id, title, content, category, is_pinned, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, title, content, category, is_pinned, created_at, created_by,
                      updated_at, updated_by, is_deleted, deleted_at, deleted_by
            "#,
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.category.as_str())
        .bind(note.is_pinned)
        .bind(note.created_at)
        .bind(note.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_note())
    }

    async fn update(&self, note: &Note) -> Result<Note, AppError> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            UPDATE notes
            SET title = $3, content = $4, category = $5, is_pinned = $6, updated_at = $7,
                updated_by = $8, is_deleted = $9, deleted_at = $10, deleted_by = $11
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, content, category, is_pinned, created_at, created_by,
                      updated_at, updated_by, is_deleted, deleted_at, deleted_by
            "#,
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.category.as_str())
        .bind(note.is_pinned)
        .bind(note.updated_at)
        .bind(note.updated_by)
        .bind(note.is_deleted)
        .bind(note.deleted_at)
        .bind(note.deleted_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

        Ok(row.into_note())
    }
}
