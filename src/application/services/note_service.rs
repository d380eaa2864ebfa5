//! Note Service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::dto::request::NoteRequest;
use crate::application::dto::response::{NoteResponse, NoteStatsResponse};
use crate::domain::{Note, NoteCategory, NoteRepository, NoteStats};
use crate::shared::error::AppError;

/// Note service trait for dependency injection
#[async_trait]
pub trait NoteService: Send + Sync {
    /// Pinned first, then newest.
    async fn list(&self, user_id: Uuid) -> Result<Vec<NoteResponse>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NoteResponse, AppError>;

    async fn create(&self, user_id: Uuid, req: NoteRequest) -> Result<NoteResponse, AppError>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: NoteRequest,
    ) -> Result<NoteResponse, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError>;

    async fn stats(&self, user_id: Uuid) -> Result<NoteStatsResponse, AppError>;
}

/// NoteService implementation
pub struct NoteServiceImpl<R>
where
    R: NoteRepository,
{
    note_repo: Arc<R>,
}

impl<R> NoteServiceImpl<R>
where
    R: NoteRepository,
{
    pub fn new(note_repo: Arc<R>) -> Self {
        Self { note_repo }
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> Result<Note, AppError> {
        self.note_repo
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found.".into()))
    }
}

fn parse_category(raw: &str) -> Result<NoteCategory, AppError> {
    raw.parse::<NoteCategory>().map_err(AppError::Validation)
}

#[async_trait]
impl<R> NoteService for NoteServiceImpl<R>
where
    R: NoteRepository + 'static,
{
    async fn list(&self, user_id: Uuid) -> Result<Vec<NoteResponse>, AppError> {
        let notes = self.note_repo.list(user_id).await?;
        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NoteResponse, AppError> {
        Ok(self.find_owned(user_id, id).await?.into())
    }

    async fn create(&self, user_id: Uuid, req: NoteRequest) -> Result<NoteResponse, AppError> {
        let category = parse_category(&req.category)?;
        let note = Note::new(
            user_id,
            req.title.trim().to_string(),
            req.content,
            category,
            req.is_pinned,
        );

        let created = self.note_repo.create(&note).await?;
        info!(user_id = %user_id, note_id = %created.id, "Note created");
        Ok(created.into())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: NoteRequest,
    ) -> Result<NoteResponse, AppError> {
        let category = parse_category(&req.category)?;
        let mut note = self.find_owned(user_id, id).await?;
        note.update(
            req.title.trim().to_string(),
            req.content,
            category,
            req.is_pinned,
            user_id,
        );

        Ok(self.note_repo.update(&note).await?.into())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut note = self.find_owned(user_id, id).await?;
        note.soft_delete(user_id);
        self.note_repo.update(&note).await?;

        info!(user_id = %user_id, note_id = %id, "Note deleted");
        Ok(())
    }

    async fn stats(&self, user_id: Uuid) -> Result<NoteStatsResponse, AppError> {
        let notes = self.note_repo.list(user_id).await?;
        Ok(NoteStats::from_notes(notes).into())
    }
}
