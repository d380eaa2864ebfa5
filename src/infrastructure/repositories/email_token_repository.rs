//! Email Token Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{EmailToken, EmailTokenPurpose, EmailTokenRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct EmailTokenRow {
    id: Uuid,
    token: String,
    identity_token: String,
    purpose: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl EmailTokenRow {
    fn into_token(self) -> Result<EmailToken, AppError> {
        let purpose = self
            .purpose
            .parse::<EmailTokenPurpose>()
            .map_err(AppError::Internal)?;

        Ok(EmailToken {
            id: self.id,
            token: self.token,
            identity_token: self.identity_token,
            purpose,
            user_id: self.user_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
            used: self.used,
        })
    }
}

#[derive(Clone)]
pub struct PgEmailTokenRepository {
    pool: PgPool,
}

impl PgEmailTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTokenRepository for PgEmailTokenRepository {
    async fn create(&self, token: &EmailToken) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_tokens (id, token, identity_token, purpose, user_id, created_at, expires_at, used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.id)
        .bind(&token.token)
        .bind(&token.identity_token)
        .bind(token.purpose.as_str())
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<EmailToken>, AppError> {
        let row = sqlx::query_as::<_, EmailTokenRow>(
            r#"
            SELECT id, token, identity_token, purpose, user_id, created_at, expires_at, used
            FROM email_tokens
            WHERE token = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE email_tokens SET used = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn invalidate_for_user(
        &self,
        user_id: Uuid,
        purpose: EmailTokenPurpose,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE email_tokens SET used = TRUE WHERE user_id = $1 AND purpose = $2 AND NOT used",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM email_tokens WHERE expires_at < $1 OR used")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
