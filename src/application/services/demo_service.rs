//! Demo Service
//!
//! Lets visitors of a public demo try each system role on their own
//! account. Disabled outside demo mode.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::AccountContext;
use crate::application::dto::request::SwitchRoleRequest;
use crate::domain::{RoleRepository, SystemRole, UserRepository};
use crate::shared::error::AppError;

#[async_trait]
pub trait DemoService: Send + Sync {
    /// Make `role` the caller's only role. The current access token stops
    /// working; the client refreshes to pick up the new claims.
    async fn switch_role(&self, user_id: Uuid, req: SwitchRoleRequest) -> Result<(), AppError>;
}

pub struct DemoServiceImpl<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    ctx: AccountContext,
}

impl<U, R> DemoServiceImpl<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(user_repo: Arc<U>, role_repo: Arc<R>, ctx: AccountContext) -> Self {
        Self {
            user_repo,
            role_repo,
            ctx,
        }
    }
}

#[async_trait]
impl<U, R> DemoService for DemoServiceImpl<U, R>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
{
    async fn switch_role(&self, user_id: Uuid, req: SwitchRoleRequest) -> Result<(), AppError> {
        if !self.ctx.settings.demo.enabled {
            return Err(AppError::NotFound("Not found.".into()));
        }

        let system_role = SystemRole::from_name(req.role.trim()).ok_or_else(|| {
            AppError::Validation("Role must be one of: SuperAdmin, Admin, User".into())
        })?;

        let role = self
            .role_repo
            .find_by_name(system_role.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found.", system_role.as_str())))?;

        self.role_repo.replace_user_roles(user_id, role.id).await?;
        self.user_repo.rotate_security_stamps(&[user_id]).await?;
        self.ctx.evict_users(&[user_id]).await;

        info!(user_id = %user_id, role = %role.name, "Demo role switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::permissive_context;
    use crate::domain::{MockRoleRepository, MockUserRepository, Role};
    use crate::infrastructure::cache::{keys, CacheExt};
    use chrono::Utc;
    use mockall::predicate::*;

    fn demo_context() -> AccountContext {
        let mut ctx = permissive_context();
        let mut settings = (*ctx.settings).clone();
        settings.demo.enabled = true;
        ctx.settings = Arc::new(settings);
        ctx
    }

    fn request(role: &str) -> SwitchRoleRequest {
        SwitchRoleRequest { role: role.into() }
    }

    #[tokio::test]
    async fn test_disabled_outside_demo_mode() {
        let service = DemoServiceImpl::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockRoleRepository::new()),
            permissive_context(),
        );
        assert!(matches!(
            service.switch_role(Uuid::new_v4(), request("Admin")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_custom_roles() {
        let service = DemoServiceImpl::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockRoleRepository::new()),
            demo_context(),
        );
        match service.switch_role(Uuid::new_v4(), request("Support")).await {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "Role must be one of: SuperAdmin, Admin, User")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_switch_replaces_roles_and_evicts() {
        let user_id = Uuid::new_v4();
        let role = Role {
            id: Uuid::new_v4(),
            name: "Admin".into(),
            description: None,
            is_system: true,
            created_at: Utc::now(),
        };
        let role_id = role.id;

        let mut roles = MockRoleRepository::new();
        roles
            .expect_find_by_name()
            .returning(move |_| Ok(Some(role.clone())));
        roles
            .expect_replace_user_roles()
            .with(eq(user_id), eq(role_id))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut users = MockUserRepository::new();
        users
            .expect_rotate_security_stamps()
            .times(1)
            .returning(|_| Ok(()));

        let ctx = demo_context();
        ctx.cache
            .set_ex(&keys::security_stamp(user_id), &"OLD", 60)
            .await
            .unwrap();

        let service = DemoServiceImpl::new(Arc::new(users), Arc::new(roles), ctx.clone());
        service.switch_role(user_id, request("Admin")).await.unwrap();

        let cached: Option<String> = ctx.cache.get(&keys::security_stamp(user_id)).await.unwrap();
        assert!(cached.is_none());
    }
}
