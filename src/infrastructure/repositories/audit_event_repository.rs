//! Audit Event Repository Implementation
//!
//! Metadata is stored as JSONB and read back as text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditEvent, AuditEventRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct AuditEventRow {
    id: Uuid,
    user_id: Option<Uuid>,
    action: String,
    target_entity_type: Option<String>,
    target_entity_id: Option<Uuid>,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditEventRow {
    fn into_event(self) -> AuditEvent {
        AuditEvent {
            id: self.id,
            user_id: self.user_id,
            action: self.action,
            target_entity_type: self.target_entity_type,
            target_entity_id: self.target_entity_id,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgAuditEventRepository {
    pool: PgPool,
}

impl PgAuditEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditEventRepository for PgAuditEventRepository {
    async fn insert(&self, event: &AuditEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (id, user_id, action, target_entity_type, target_entity_id, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6::JSONB, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.action)
        .bind(&event.target_entity_type)
        .bind(event.target_entity_id)
        .bind(&event.metadata)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        exclude_actions: Vec<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AuditEvent>, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM audit_events
            WHERE (user_id = $1 OR target_entity_id = $1) AND NOT (action = ANY($2))
            "#,
        )
        .bind(user_id)
        .bind(&exclude_actions)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, user_id, action, target_entity_type, target_entity_id,
                   metadata::TEXT AS metadata, created_at
            FROM audit_events
            WHERE (user_id = $1 OR target_entity_id = $1) AND NOT (action = ANY($2))
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(&exclude_actions)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into_event()).collect(), total))
    }

    async fn list_for_entity(
        &self,
        entity_type: String,
        entity_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AuditEvent>, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_events WHERE target_entity_type = $1 AND target_entity_id = $2",
        )
        .bind(&entity_type)
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, user_id, action, target_entity_type, target_entity_id,
                   metadata::TEXT AS metadata, created_at
            FROM audit_events
            WHERE target_entity_type = $1 AND target_entity_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&entity_type)
        .bind(entity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into_event()).collect(), total))
    }
}
