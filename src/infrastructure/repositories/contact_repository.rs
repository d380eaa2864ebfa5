//! Contact Repository Implementation
//!
//! PostgreSQL implementation of the ContactRepository trait. Every query is
//! scoped to the owning user and skips soft-deleted rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Contact, ContactListQuery, ContactRepository, ContactSort, ContactSource, ContactStatus,
};
use crate::shared::error::AppError;

const CONTACT_COLUMNS: &str = "id, user_id, name, email, company, phone, status, source, value, \
     notes, is_favorite, created_at, created_by, updated_at, updated_by, is_deleted, deleted_at, \
     deleted_by";

/// Database row matching the contacts table.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    email: Option<String>,
    company: Option<String>,
    phone: Option<String>,
    status: i16,
    source: i16,
    value: Option<Decimal>,
    notes: Option<String>,
    is_favorite: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl ContactRow {
    fn into_contact(self) -> Contact {
        Contact {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            company: self.company,
            phone: self.phone,
            status: ContactStatus::from_i16(self.status),
            source: ContactSource::from_i16(self.source),
            value: self.value,
            notes: self.notes,
            is_favorite: self.is_favorite,
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

/// ORDER BY clause for a whitelisted sort. Favorites always lead.
fn order_by(sort: ContactSort) -> &'static str {
    match sort {
        ContactSort::Newest => "is_favorite DESC, created_at DESC",
        ContactSort::Oldest => "is_favorite DESC, created_at ASC",
        ContactSort::NameAsc => "is_favorite DESC, name ASC, created_at DESC",
        ContactSort::NameDesc => "is_favorite DESC, name DESC, created_at DESC",
        ContactSort::ValueAsc => "is_favorite DESC, value ASC NULLS FIRST, created_at DESC",
        ContactSort::ValueDesc => "is_favorite DESC, value DESC NULLS LAST, created_at DESC",
        ContactSort::StatusAsc => "is_favorite DESC, status ASC, created_at DESC",
        ContactSort::StatusDesc => "is_favorite DESC, status DESC, created_at DESC",
    }
}

/// Build an ILIKE pattern that matches `term` literally anywhere.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// PostgreSQL contact repository implementation.
#[derive(Clone)]
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2 AND NOT is_deleted",
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_contact()))
    }

    async fn list(
        &self,
        user_id: Uuid,
        query: &ContactListQuery,
    ) -> Result<(Vec<Contact>, i64), AppError> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let filter = r#"
            user_id = $1 AND NOT is_deleted
            AND ($2::TEXT IS NULL
                 OR name ILIKE $2
                 OR email ILIKE $2
                 OR company ILIKE $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contacts WHERE {}", filter))
            .bind(user_id)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM contacts WHERE {} ORDER BY {} LIMIT $3 OFFSET $4",
            CONTACT_COLUMNS,
            filter,
            order_by(query.sort)
        );
        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(user_id)
            .bind(pattern.as_deref())
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(|r| r.into_contact()).collect(), total))
    }

    async fn find_all(&self, user_id: Uuid) -> Result<Vec<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 AND NOT is_deleted ORDER BY created_at DESC",
            CONTACT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_contact()).collect())
    }

    async fn count(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE user_id = $1 AND NOT is_deleted")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn create(&self, contact: &Contact) -> Result<Contact, AppError> {
        let sql = format!(
            r#"
            INSERT INTO contacts (
                id, user_id, name, email, company, phone, status, source, value, notes,
                is_favorite, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(contact.id)
            .bind(contact.user_id)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.company)
            .bind(&contact.phone)
            .bind(contact.status.as_i16())
            .bind(contact.source.as_i16())
            .bind(contact.value)
            .bind(&contact.notes)
            .bind(contact.is_favorite)
            .bind(contact.created_at)
            .bind(contact.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into_contact())
    }

    /// Insert every contact in one transaction.
    async fn create_many(&self, contacts: &[Contact]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for contact in contacts {
            sqlx::query(
                r#"
                INSERT INTO contacts (
                    id, user_id, name, email, company, phone, status, source, value, notes,
                    is_favorite, created_at, created_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(contact.id)
            .bind(contact.user_id)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.company)
            .bind(&contact.phone)
            .bind(contact.status.as_i16())
            .bind(contact.source.as_i16())
            .bind(contact.value)
            .bind(&contact.notes)
            .bind(contact.is_favorite)
            .bind(contact.created_at)
            .bind(contact.created_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, contact: &Contact) -> Result<Contact, AppError> {
        let sql = format!(
            r#"
            UPDATE contacts
            SET name = $3, email = $4, company = $5, phone = $6, status = $7, source = $8,
                value = $9, notes = $10, is_favorite = $11, updated_at = $12, updated_by = $13,
                is_deleted = $14, deleted_at = $15, deleted_by = $16
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(contact.id)
            .bind(contact.user_id)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.company)
            .bind(&contact.phone)
            .bind(contact.status.as_i16())
            .bind(contact.source.as_i16())
            .bind(contact.value)
            .bind(&contact.notes)
            .bind(contact.is_favorite)
            .bind(contact.updated_at)
            .bind(contact.updated_by)
            .bind(contact.is_deleted)
            .bind(contact.deleted_at)
            .bind(contact.deleted_by)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

        Ok(row.into_contact())
    }

    async fn soft_delete_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let deleted: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE contacts
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $1
            WHERE user_id = $1 AND id = ANY($2) AND NOT is_deleted
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(deleted)
    }

    async fn soft_delete_all(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let deleted: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE contacts
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $1
            WHERE user_id = $1 AND NOT is_deleted
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_always_lead() {
        for sort in [
            ContactSort::Newest,
            ContactSort::Oldest,
            ContactSort::NameAsc,
            ContactSort::ValueDesc,
            ContactSort::StatusDesc,
        ] {
            assert!(order_by(sort).starts_with("is_favorite DESC"));
        }
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("acme"), "%acme%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
