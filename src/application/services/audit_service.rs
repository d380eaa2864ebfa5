//! Audit Service
//!
//! Writes and reads the append-only audit log. Writing never fails the
//! caller: storage errors are logged and counted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::dto::response::{AuditEventResponse, AuditEventsResponse};
use crate::domain::{AuditAction, AuditEvent, AuditEventRepository};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::PaginationQuery;

/// Audit service trait for dependency injection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Record an action. Errors are swallowed.
    async fn log(
        &self,
        user_id: Option<Uuid>,
        action: AuditAction,
        target_entity_type: Option<&'static str>,
        target_entity_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    );

    /// Events where the user is the actor or the target, excluding contact
    /// activity.
    async fn user_events(
        &self,
        user_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError>;

    async fn entity_events(
        &self,
        entity_type: &'static str,
        entity_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError>;
}

/// AuditService implementation
pub struct AuditServiceImpl<R>
where
    R: AuditEventRepository,
{
    audit_repo: Arc<R>,
}

impl<R> AuditServiceImpl<R>
where
    R: AuditEventRepository,
{
    pub fn new(audit_repo: Arc<R>) -> Self {
        Self { audit_repo }
    }
}

fn to_response(
    (events, total_count): (Vec<AuditEvent>, i64),
    page: PaginationQuery,
) -> AuditEventsResponse {
    AuditEventsResponse {
        events: events.into_iter().map(AuditEventResponse::from).collect(),
        total_count,
        page_number: page.page_number,
        page_size: page.page_size,
    }
}

#[async_trait]
impl<R> AuditService for AuditServiceImpl<R>
where
    R: AuditEventRepository + 'static,
{
    async fn log(
        &self,
        user_id: Option<Uuid>,
        action: AuditAction,
        target_entity_type: Option<&'static str>,
        target_entity_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) {
        let event = AuditEvent::new(action, user_id, target_entity_type, target_entity_id, metadata);

        match self.audit_repo.insert(&event).await {
            Ok(()) => {
                metrics::record_audit_event(action.as_str());
                debug!(action = %action, user_id = ?user_id, "Audit event recorded");
            }
            Err(e) => {
                metrics::record_audit_failure();
                error!(action = %action, user_id = ?user_id, error = %e, "Failed to write audit event");
            }
        }
    }

    async fn user_events(
        &self,
        user_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError> {
        let excluded = AuditAction::CONTACT_ACTIONS
            .iter()
            .map(|a| a.as_str().to_string())
            .collect();

        let result = self
            .audit_repo
            .list_for_user(user_id, excluded, page.limit(), page.offset())
            .await?;

        Ok(to_response(result, page))
    }

    async fn entity_events(
        &self,
        entity_type: &'static str,
        entity_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError> {
        let result = self
            .audit_repo
            .list_for_entity(entity_type.to_string(), entity_id, page.limit(), page.offset())
            .await?;

        Ok(to_response(result, page))
    }
}
