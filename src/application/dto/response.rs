//! Response DTOs
//!
//! Data structures for API response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AuditEvent, Contact, ContactSource, ContactStats, ContactStatus, Note, NoteCategory,
    NoteStats, PermissionGroup, Role, RoleWithCount, User,
};
use crate::infrastructure::jobs::{JobExecution, JobSnapshot, JobStatus};

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Contacts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub status: ContactStatus,
    pub source: ContactSource,
    pub value: Option<Decimal>,
    pub notes: Option<String>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            company: contact.company,
            phone: contact.phone,
            status: contact.status,
            source: contact.source,
            value: contact.value,
            notes: contact.notes,
            is_favorite: contact.is_favorite,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactStatsResponse {
    pub total_count: i64,
    pub customer_count: i64,
    pub total_pipeline_value: Decimal,
    pub by_status: BTreeMap<ContactStatus, i64>,
    pub by_source: BTreeMap<ContactSource, i64>,
    pub pipeline_value: BTreeMap<ContactStatus, Decimal>,
    pub recent_contacts: Vec<ContactResponse>,
}

impl From<ContactStats> for ContactStatsResponse {
    fn from(stats: ContactStats) -> Self {
        Self {
            total_count: stats.total_count,
            customer_count: stats.customer_count,
            total_pipeline_value: stats.total_pipeline_value,
            by_status: stats.by_status,
            by_source: stats.by_source,
            pipeline_value: stats.pipeline_value,
            recent_contacts: stats.recent.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

// ============================================================================
// Notes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            category: note.category,
            is_pinned: note.is_pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteStatsResponse {
    pub total_count: i64,
    pub pinned_count: i64,
    pub by_category: BTreeMap<NoteCategory, i64>,
    pub recent_notes: Vec<NoteResponse>,
}

impl From<NoteStats> for NoteStatsResponse {
    fn from(stats: NoteStats) -> Self {
        Self {
            total_count: stats.total_count,
            pinned_count: stats.pinned_count,
            by_category: stats.by_category,
            recent_notes: stats.recent.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Audit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEventResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub target_entity_type: Option<String>,
    pub target_entity_id: Option<Uuid>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEvent> for AuditEventResponse {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            action: event.action,
            target_entity_type: event.target_entity_type,
            target_entity_id: event.target_entity_id,
            metadata: event.metadata,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEventsResponse {
    pub events: Vec<AuditEventResponse>,
    pub total_count: i64,
    pub page_number: i64,
    pub page_size: i64,
}

// ============================================================================
// Authentication & profile
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// The signed-in user's own profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email_confirmed: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: User, roles: Vec<String>, permissions: Vec<String>) -> Self {
        Self {
            id: user.id,
            username: user.email.clone(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            bio: user.bio,
            avatar_url: user.avatar_url,
            email_confirmed: user.email_confirmed,
            roles,
            permissions,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: Vec<String>,
    pub email_confirmed: bool,
    pub lockout_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub access_failed_count: i32,
    pub is_locked_out: bool,
}

impl AdminUserResponse {
    pub fn new(user: User, roles: Vec<String>) -> Self {
        let is_locked_out = user.is_locked_out(Utc::now());
        Self {
            id: user.id,
            username: user.email.clone(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            bio: user.bio,
            avatar_url: user.avatar_url,
            roles,
            email_confirmed: user.email_confirmed,
            lockout_enabled: user.lockout_enabled,
            lockout_end: user.lockout_end,
            access_failed_count: user.access_failed_count,
            is_locked_out,
        }
    }

    /// Hide contact details for demo listings.
    pub fn anonymized(self) -> Self {
        Self {
            username: mask_email(&self.username),
            email: mask_email(&self.email),
            phone_number: self.phone_number.map(|_| "***".to_string()),
            ..self
        }
    }
}

/// `ada@example.com` becomes `a***@e***.com`.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@').filter(|(l, _)| !l.is_empty()) else {
        return "***@***.com".to_string();
    };

    let first = |s: &str| s.chars().next().map(String::from).unwrap_or_default();

    match domain.rfind('.').filter(|i| *i > 0) {
        Some(dot) => format!("{}***@{}***{}", first(local), first(domain), &domain[dot..]),
        None => format!("{}***@***.com", first(local)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub user_count: i64,
}

impl From<RoleWithCount> for RoleResponse {
    fn from(entry: RoleWithCount) -> Self {
        Self {
            id: entry.role.id,
            name: entry.role.name,
            description: entry.role.description,
            is_system: entry.role.is_system,
            user_count: entry.user_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub permissions: Vec<String>,
    pub user_count: i64,
}

impl RoleDetailResponse {
    pub fn new(role: Role, permissions: Vec<String>, user_count: i64) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            is_system: role.is_system,
            permissions,
            user_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionGroupResponse {
    pub category: String,
    pub permissions: Vec<String>,
}

impl From<PermissionGroup> for PermissionGroupResponse {
    fn from(group: PermissionGroup) -> Self {
        Self {
            category: group.category.to_string(),
            permissions: group.permissions.into_iter().map(String::from).collect(),
        }
    }
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringJobOutput {
    pub id: String,
    pub cron: String,
    pub next_execution: Option<DateTime<Utc>>,
    pub last_execution: Option<DateTime<Utc>>,
    pub last_status: Option<JobStatus>,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobExecutionOutput {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

impl From<JobExecution> for JobExecutionOutput {
    fn from(execution: JobExecution) -> Self {
        Self {
            job_id: execution.job_id,
            status: execution.status,
            started_at: execution.started_at,
            duration_ms: execution.duration_ms,
            error: execution.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringJobDetailOutput {
    #[serde(flatten)]
    pub job: RecurringJobOutput,
    pub execution_history: Vec<JobExecutionOutput>,
}

impl From<JobSnapshot> for RecurringJobOutput {
    fn from(snapshot: JobSnapshot) -> Self {
        Self {
            id: snapshot.id,
            cron: snapshot.cron,
            next_execution: snapshot.next_execution,
            last_execution: snapshot.last_execution,
            last_status: snapshot.last_status,
            is_paused: snapshot.is_paused,
            created_at: snapshot.created_at,
        }
    }
}

impl From<JobSnapshot> for RecurringJobDetailOutput {
    fn from(mut snapshot: JobSnapshot) -> Self {
        let history = std::mem::take(&mut snapshot.history);
        Self {
            job: snapshot.into(),
            execution_history: history.into_iter().map(Into::into).collect(),
        }
    }
}
