//! Note entity and repository trait.
//!
//! Maps to the `notes` table. Category is stored by name.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NoteCategory {
    Personal,
    Work,
    Ideas,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 3] = [Self::Personal, Self::Work, Self::Ideas];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Ideas => "Ideas",
        }
    }
}

impl FromStr for NoteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown note category '{}'", s))
    }
}

impl std::fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-owned note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

impl Note {
    pub fn new(
        user_id: Uuid,
        title: String,
        content: String,
        category: NoteCategory,
        is_pinned: bool,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            content,
            category,
            is_pinned,
            created_at: Utc::now(),
            created_by: Some(user_id),
            updated_at: None,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    pub fn update(
        &mut self,
        title: String,
        content: String,
        category: NoteCategory,
        is_pinned: bool,
        actor: Uuid,
    ) {
        self.title = title;
        self.content = content;
        self.category = category;
        self.is_pinned = is_pinned;
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(actor);
    }

    pub fn soft_delete(&mut self, actor: Uuid) {
        self.is_deleted = true;
        self.deleted_at = Some(Utc::now());
        self.deleted_by = Some(actor);
    }
}

/// Aggregated note numbers for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteStats {
    pub total_count: i64,
    pub pinned_count: i64,
    pub by_category: BTreeMap<NoteCategory, i64>,
    pub recent: Vec<Note>,
}

impl NoteStats {
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        let mut by_category: BTreeMap<NoteCategory, i64> =
            NoteCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for note in &notes {
            *by_category.entry(note.category).or_default() += 1;
        }

        let total_count = notes.len() as i64;
        let pinned_count = notes.iter().filter(|n| n.is_pinned).count() as i64;

        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes.truncate(5);

        Self {
            total_count,
            pinned_count,
            by_category,
            recent: notes,
        }
    }
}

/// Repository trait for Note data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, AppError>;

    /// Live notes of a user, pinned first then newest.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>, AppError>;

    async fn create(&self, note: &Note) -> Result<Note, AppError>;

    /// Persist all mutable columns, including soft-delete state.
    async fn update(&self, note: &Note) -> Result<Note, AppError>;
}
