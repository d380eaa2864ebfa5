//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, token rotation, password flows
//! - **UserService**: The signed-in user's own profile
//! - **ContactService**: Contacts, pipeline statistics, seeding
//! - **NoteService**: Notes and note statistics
//! - **AuditService**: Append-only audit log
//! - **AdminService**: User administration
//! - **RoleService**: Roles and permissions
//! - **JobService**: Recurring job management
//! - **DemoService**: Demo-mode role switching

pub mod admin_service;
pub mod audit_service;
pub mod auth_service;
pub mod contact_service;
pub mod demo_service;
pub mod email_token_service;
pub mod job_service;
pub mod note_service;
pub mod role_service;
pub mod token_service;
pub mod user_service;

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::SystemRole;
use crate::infrastructure::cache::{keys, Cache};
use crate::infrastructure::email::{EmailMessage, EmailService};
use crate::infrastructure::metrics;

pub use admin_service::{AdminService, AdminServiceImpl};
pub use audit_service::{AuditService, AuditServiceImpl};
pub use auth_service::{AuthService, AuthServiceImpl};
pub use contact_service::{ContactService, ContactServiceImpl};
pub use demo_service::{DemoService, DemoServiceImpl};
pub use email_token_service::{EmailTokenService, EmailTokenServiceImpl};
pub use job_service::{JobService, JobServiceImpl};
pub use note_service::{NoteService, NoteServiceImpl};
pub use role_service::{RoleService, RoleServiceImpl};
pub use token_service::{Claims, IssuedToken, TokenService};
pub use user_service::{UserService, UserServiceImpl};

#[cfg(test)]
pub use audit_service::MockAuditService;
#[cfg(test)]
pub use email_token_service::MockEmailTokenService;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn new(user_id: Uuid, roles: Vec<String>) -> Self {
        Self { user_id, roles }
    }

    pub fn is_super_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|r| r == SystemRole::SuperAdmin.as_str())
    }
}

/// Collaborators shared by the account-facing services.
#[derive(Clone)]
pub struct AccountContext {
    pub audit: Arc<dyn AuditService>,
    pub email_tokens: Arc<dyn EmailTokenService>,
    pub mailer: Arc<dyn EmailService>,
    pub cache: Arc<dyn Cache>,
    pub settings: Arc<Settings>,
}

impl AccountContext {
    /// Drop cached security stamps and profiles so the next request reads
    /// the database.
    pub async fn evict_users(&self, user_ids: &[Uuid]) {
        let keys: Vec<String> = user_ids
            .iter()
            .flat_map(|id| keys::all_for_user(*id))
            .collect();
        if keys.is_empty() {
            return;
        }

        if let Err(e) = self.cache.delete_many(&keys).await {
            warn!(error = %e, users = user_ids.len(), "Failed to evict cached user entries");
        }
    }

    /// Send a transactional email. Delivery failures are logged only.
    pub async fn deliver(&self, template: &'static str, message: EmailMessage) {
        let to = message.to.clone();
        match self.mailer.send(message).await {
            Ok(()) => {
                metrics::record_email(template, true);
                info!(template, to = %to, "Email sent");
            }
            Err(e) => {
                metrics::record_email(template, false);
                warn!(template, to = %to, error = %e, "Email delivery failed");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::test_settings;
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::email::MockEmailService;

    /// Context whose audit log, mailer and token store accept anything.
    pub(crate) fn permissive_context() -> AccountContext {
        let mut audit = MockAuditService::new();
        audit.expect_log().returning(|_, _, _, _, _| ());

        let mut mailer = MockEmailService::new();
        mailer.expect_send().returning(|_| Ok(()));

        let mut email_tokens = MockEmailTokenService::new();
        email_tokens
            .expect_create()
            .returning(|_, _, _| Ok("raw-token".to_string()));

        AccountContext {
            audit: Arc::new(audit),
            email_tokens: Arc::new(email_tokens),
            mailer: Arc::new(mailer),
            cache: Arc::new(InMemoryCache::new()),
            settings: Arc::new(test_settings()),
        }
    }
}
