//! Contact entity and repository trait.
//!
//! Maps to the `contacts` table. Contacts are owned by a single user and
//! are soft-deleted; repositories never return rows with `is_deleted` set.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Position of a contact in the sales pipeline.
///
/// Stored as `SMALLINT` (declaration order), exposed by name in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    Lead,
    Prospect,
    Customer,
    Churned,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::Lead,
        ContactStatus::Prospect,
        ContactStatus::Customer,
        ContactStatus::Churned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Prospect => "Prospect",
            Self::Customer => "Customer",
            Self::Churned => "Churned",
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Lead => 0,
            Self::Prospect => 1,
            Self::Customer => 2,
            Self::Churned => 3,
        }
    }

    /// Convert from database representation. Unknown values read as Lead.
    pub fn from_i16(value: i16) -> Self {
        match value {
            1 => Self::Prospect,
            2 => Self::Customer,
            3 => Self::Churned,
            _ => Self::Lead,
        }
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown contact status '{}'", s))
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel through which a contact was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactSource {
    Website,
    Referral,
    Social,
    Email,
    Phone,
    Other,
}

impl ContactSource {
    pub const ALL: [ContactSource; 6] = [
        ContactSource::Website,
        ContactSource::Referral,
        ContactSource::Social,
        ContactSource::Email,
        ContactSource::Phone,
        ContactSource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "Website",
            Self::Referral => "Referral",
            Self::Social => "Social",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Other => "Other",
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Website => 0,
            Self::Referral => 1,
            Self::Social => 2,
            Self::Email => 3,
            Self::Phone => 4,
            Self::Other => 5,
        }
    }

    /// Convert from database representation. Unknown values read as Other.
    pub fn from_i16(value: i16) -> Self {
        match value {
            0 => Self::Website,
            1 => Self::Referral,
            2 => Self::Social,
            3 => Self::Email,
            4 => Self::Phone,
            _ => Self::Other,
        }
    }
}

impl FromStr for ContactSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown contact source '{}'", s))
    }
}

impl std::fmt::Display for ContactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable contact fields, shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactFields {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub status: ContactStatus,
    pub source: ContactSource,
    pub value: Option<Decimal>,
    pub notes: Option<String>,
}

/// A user-owned CRM contact.
///
/// Maps to the `contacts` table:
/// - id: UUID PRIMARY KEY
/// - user_id: UUID NOT NULL
/// - status, source: SMALLINT NOT NULL
/// - value: NUMERIC(18, 2) NULL
/// - created_*/updated_*/deleted_* audit columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub created_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

impl Contact {
    /// Create a new contact owned by `user_id`.
    pub fn new(user_id: Uuid, fields: ContactFields) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            name: fields.name,
            email: fields.email,
            company: fields.company,
            phone: fields.phone,
            status: fields.status,
            source: fields.source,
            value: fields.value,
            notes: fields.notes,
            is_favorite: false,
            created_at: Utc::now(),
            created_by: Some(user_id),
            updated_at: None,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Replace all editable fields.
    pub fn update(&mut self, fields: ContactFields, is_favorite: bool, actor: Uuid) {
        self.name = fields.name;
        self.email = fields.email;
        self.company = fields.company;
        self.phone = fields.phone;
        self.status = fields.status;
        self.source = fields.source;
        self.value = fields.value;
        self.notes = fields.notes;
        self.is_favorite = is_favorite;
        self.touch(actor);
    }

    pub fn toggle_favorite(&mut self, actor: Uuid) {
        self.is_favorite = !self.is_favorite;
        self.touch(actor);
    }

    pub fn soft_delete(&mut self, actor: Uuid) {
        self.is_deleted = true;
        self.deleted_at = Some(Utc::now());
        self.deleted_by = Some(actor);
    }

    /// Contributes to the open pipeline (everything except churned).
    pub fn is_in_pipeline(&self) -> bool {
        self.status != ContactStatus::Churned
    }

    fn touch(&mut self, actor: Uuid) {
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(actor);
    }
}

/// Whitelisted list orderings. Favorites always sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactSort {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
    ValueAsc,
    ValueDesc,
    StatusAsc,
    StatusDesc,
}

impl ContactSort {
    /// Parse `name`, `-name`, `value`, `-value`, `created`, `-created`,
    /// `status`, `-status`. Anything else yields the default order.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "name" => Self::NameAsc,
            "-name" => Self::NameDesc,
            "value" => Self::ValueAsc,
            "-value" => Self::ValueDesc,
            "created" => Self::Oldest,
            "-created" => Self::Newest,
            "status" => Self::StatusAsc,
            "-status" => Self::StatusDesc,
            _ => Self::Newest,
        }
    }
}

/// Filter and paging for a contact listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactListQuery {
    pub search: Option<String>,
    pub sort: ContactSort,
    pub limit: i64,
    pub offset: i64,
}

/// Aggregated pipeline numbers for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactStats {
    pub total_count: i64,
    pub customer_count: i64,
    pub total_pipeline_value: Decimal,
    pub by_status: BTreeMap<ContactStatus, i64>,
    pub by_source: BTreeMap<ContactSource, i64>,
    pub pipeline_value: BTreeMap<ContactStatus, Decimal>,
    pub recent: Vec<Contact>,
}

pub const RECENT_CONTACTS: usize = 5;

impl ContactStats {
    /// Compute stats over a user's live contacts. Every status and source
    /// is present in the maps, with zero when unused.
    pub fn from_contacts(mut contacts: Vec<Contact>) -> Self {
        let mut by_status: BTreeMap<ContactStatus, i64> =
            ContactStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_source: BTreeMap<ContactSource, i64> =
            ContactSource::ALL.iter().map(|s| (*s, 0)).collect();
        let mut pipeline_value: BTreeMap<ContactStatus, Decimal> =
            ContactStatus::ALL.iter().map(|s| (*s, Decimal::ZERO)).collect();
        let mut total_pipeline_value = Decimal::ZERO;

        for contact in &contacts {
            *by_status.entry(contact.status).or_default() += 1;
            *by_source.entry(contact.source).or_default() += 1;
            let value = contact.value.unwrap_or(Decimal::ZERO);
            *pipeline_value.entry(contact.status).or_default() += value;
            if contact.is_in_pipeline() {
                total_pipeline_value += value;
            }
        }

        let total_count = contacts.len() as i64;
        let customer_count = by_status[&ContactStatus::Customer];

        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        contacts.truncate(RECENT_CONTACTS);

        Self {
            total_count,
            customer_count,
            total_pipeline_value,
            by_status,
            by_source,
            pipeline_value,
            recent: contacts,
        }
    }
}

/// Repository trait for Contact data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Find a live contact owned by `user_id`.
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Contact>, AppError>;

    /// Page through a user's contacts, returning the page and total count.
    async fn list(
        &self,
        user_id: Uuid,
        query: &ContactListQuery,
    ) -> Result<(Vec<Contact>, i64), AppError>;

    /// All live contacts of a user.
    async fn find_all(&self, user_id: Uuid) -> Result<Vec<Contact>, AppError>;

    /// Count live contacts of a user.
    async fn count(&self, user_id: Uuid) -> Result<i64, AppError>;

    async fn create(&self, contact: &Contact) -> Result<Contact, AppError>;

    /// Insert many contacts in one transaction.
    async fn create_many(&self, contacts: &[Contact]) -> Result<(), AppError>;

    /// Persist all mutable columns, including soft-delete state.
    async fn update(&self, contact: &Contact) -> Result<Contact, AppError>;

    /// Soft delete the listed contacts owned by `user_id`. Returns the ids
    /// that were actually deleted.
    async fn soft_delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;

    /// Soft delete every live contact of `user_id`.
    async fn soft_delete_all(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}

#[cfg(test)]
pub(crate) fn sample_contact(user_id: Uuid) -> Contact {
    Contact::new(
        user_id,
        ContactFields {
            name: "Ada Lovelace".into(),
            email: Some("ada@example.com".into()),
            company: Some("Analytical Engines".into()),
            phone: None,
            status: ContactStatus::Lead,
            source: ContactSource::Referral,
            value: Some(Decimal::new(1_000, 0)),
            notes: None,
        },
    )
}
