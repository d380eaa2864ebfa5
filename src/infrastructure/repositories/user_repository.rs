//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait. Emails are stored
//! lowercased and matched case-insensitively.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{normalize_email, User, UserRepository};
use crate::shared::crypto::new_security_stamp;
use crate::shared::error::AppError;

/// Database row matching the users table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    email_confirmed: bool,
    lockout_enabled: bool,
    lockout_end: Option<DateTime<Utc>>,
    access_failed_count: i32,
    security_stamp: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            bio: self.bio,
            avatar_url: self.avatar_url,
            email_confirmed: self.email_confirmed,
            lockout_enabled: self.lockout_enabled,
            lockout_end: self.lockout_end,
            access_failed_count: self.access_failed_count,
            security_stamp: self.security_stamp,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                   email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                   security_stamp, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                   email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                   security_stamp, created_at, updated_at
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
                .bind(normalize_email(email))
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                security_stamp, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                      email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                      security_stamp, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.email_confirmed)
        .bind(user.lockout_enabled)
        .bind(user.lockout_end)
        .bind(user.access_failed_count)
        .bind(&user.security_stamp)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_user())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                phone_number = $6, bio = $7, avatar_url = $8, email_confirmed = $9,
                lockout_enabled = $10, lockout_end = $11, access_failed_count = $12,
                security_stamp = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                      email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                      security_stamp, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.email_confirmed)
        .bind(user.lockout_enabled)
        .bind(user.lockout_end)
        .bind(user.access_failed_count)
        .bind(&user.security_stamp)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(row.into_user())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn list(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), AppError> {
        let pattern = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE $1::TEXT IS NULL
               OR LOWER(email) LIKE $1
               OR LOWER(COALESCE(first_name, '')) LIKE $1
               OR LOWER(COALESCE(last_name, '')) LIKE $1
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, phone_number, bio, avatar_url,
                   email_confirmed, lockout_enabled, lockout_end, access_failed_count,
                   security_stamp, created_at, updated_at
            FROM users
            WHERE $1::TEXT IS NULL
               OR LOWER(email) LIKE $1
               OR LOWER(COALESCE(first_name, '')) LIKE $1
               OR LOWER(COALESCE(last_name, '')) LIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into_user()).collect(), total))
    }

    async fn get_security_stamp(&self, id: Uuid) -> Result<Option<String>, AppError> {
        let stamp: Option<String> =
            sqlx::query_scalar("SELECT security_stamp FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(stamp)
    }

    async fn rotate_security_stamps(&self, ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for id in ids {
            sqlx::query("UPDATE users SET security_stamp = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(new_security_stamp())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
