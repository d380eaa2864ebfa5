//! User Service
//!
//! Operations a signed-in user performs on their own account.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::AccountContext;
use crate::application::dto::request::{DeleteAccountRequest, UpdateProfileRequest};
use crate::application::dto::response::{AuditEventsResponse, UserResponse};
use crate::domain::{
    effective_permissions, entity_types, AuditAction, RoleRepository, SystemRole, User,
    UserRepository,
};
use crate::infrastructure::cache::{keys, CacheExt};
use crate::shared::crypto::verify_password;
use crate::shared::error::AppError;
use crate::shared::pagination::PaginationQuery;

/// User service trait for dependency injection
#[async_trait]
pub trait UserService: Send + Sync {
    /// Profile with roles and effective permissions. Cached.
    async fn me(&self, user_id: Uuid) -> Result<UserResponse, AppError>;

    /// Only fields present in the request change; an empty string clears.
    async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError>;

    async fn delete_account(
        &self,
        user_id: Uuid,
        req: DeleteAccountRequest,
    ) -> Result<(), AppError>;

    async fn my_audit(
        &self,
        user_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError>;
}

/// UserService implementation
pub struct UserServiceImpl<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    ctx: AccountContext,
}

impl<U, R> UserServiceImpl<U, R>
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

    async fn load_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    async fn build_profile(&self, user: User) -> Result<UserResponse, AppError> {
        let roles = self.role_repo.user_roles(user.id).await?;
        let granted = self.role_repo.user_permissions(user.id).await?;
        let permissions = effective_permissions(&roles, granted);
        Ok(UserResponse::new(user, roles, permissions))
    }
}

/// `None` keeps the current value, blank clears it.
fn patch(current: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        let trimmed = value.trim();
        *current = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

#[async_trait]
impl<U, R> UserService for UserServiceImpl<U, R>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
{
    async fn me(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let key = keys::user(user_id);
        match self.ctx.cache.get::<UserResponse>(&key).await {
            Ok(Some(profile)) => return Ok(profile),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Profile cache read failed"),
        }

        let user = self.load_user(user_id).await?;
        let profile = self.build_profile(user).await?;

        if let Err(e) = self
            .ctx
            .cache
            .set_ex(&key, &profile, keys::USER_TTL_SECS)
            .await
        {
            warn!(error = %e, "Profile cache write failed");
        }

        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self.load_user(user_id).await?;

        patch(&mut user.first_name, req.first_name);
        patch(&mut user.last_name, req.last_name);
        patch(&mut user.phone_number, req.phone_number);
        patch(&mut user.bio, req.bio);
        patch(&mut user.avatar_url, req.avatar_url);
        user.updated_at = Some(Utc::now());

        let user = self.user_repo.update(&user).await?;
        self.ctx.evict_users(&[user_id]).await;

        self.ctx
            .audit
            .log(
                Some(user_id),
                AuditAction::ProfileUpdate,
                Some(entity_types::USER),
                Some(user_id),
                None,
            )
            .await;

        self.build_profile(user).await
    }

    async fn delete_account(
        &self,
        user_id: Uuid,
        req: DeleteAccountRequest,
    ) -> Result<(), AppError> {
        let user = self.load_user(user_id).await?;

        let password_ok = match user.password_hash.as_deref() {
            Some(hash) => verify_password(&req.password, hash)?,
            None => false,
        };
        if !password_ok {
            return Err(AppError::BadRequest("Incorrect password.".into()));
        }

        let roles = self.role_repo.user_roles(user_id).await?;
        if roles.iter().any(|r| r == SystemRole::SuperAdmin.as_str()) {
            return Err(AppError::BadRequest(
                "Super administrators cannot delete their own account.".into(),
            ));
        }

        self.user_repo.delete(user_id).await?;
        self.ctx.evict_users(&[user_id]).await;

        info!(user_id = %user_id, "Account deleted");
        self.ctx
            .audit
            .log(
                Some(user_id),
                AuditAction::AccountDeletion,
                Some(entity_types::USER),
                Some(user_id),
                None,
            )
            .await;
        Ok(())
    }

    async fn my_audit(
        &self,
        user_id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError> {
        self.ctx.audit.user_events(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::permissive_context;
    use crate::domain::{permissions, MockRoleRepository, MockUserRepository};
    use crate::shared::crypto::hash_password;

    fn roles_returning(roles: &'static [&'static str]) -> MockRoleRepository {
        let mut repo = MockRoleRepository::new();
        repo.expect_user_roles()
            .returning(move |_| Ok(roles.iter().map(|r| r.to_string()).collect()));
        repo.expect_user_permissions()
            .returning(|_| Ok(vec![permissions::USERS_VIEW.to_string()]));
        repo
    }

    #[tokio::test]
    async fn test_me_is_cached() {
        let user = User::new("ada@example.com", None);
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(roles_returning(&["Admin"])),
            permissive_context(),
        );

        let first = service.me(id).await.unwrap();
        let second = service.me(id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.username, "ada@example.com");
        assert_eq!(first.permissions, vec![permissions::USERS_VIEW.to_string()]);
    }

    #[tokio::test]
    async fn test_super_admin_profile_has_every_permission() {
        let user = User::new("root@example.com", None);
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(roles_returning(&["SuperAdmin"])),
            permissive_context(),
        );

        let profile = service.me(id).await.unwrap();
        assert!(profile
            .permissions
            .contains(&permissions::JOBS_MANAGE.to_string()));
    }

    #[tokio::test]
    async fn test_update_profile_patches_fields() {
        let mut user = User::new("ada@example.com", None);
        user.first_name = Some("Ada".into());
        user.bio = Some("Mathematician".into());
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(|u| {
                u.first_name.as_deref() == Some("Ada")
                    && u.last_name.as_deref() == Some("Lovelace")
                    && u.bio.is_none()
            })
            .times(1)
            .returning(|u| Ok(u.clone()));

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(roles_returning(&["User"])),
            permissive_context(),
        );

        let profile = service
            .update_profile(
                id,
                UpdateProfileRequest {
                    first_name: None,
                    last_name: Some(" Lovelace ".into()),
                    phone_number: None,
                    bio: Some("".into()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_delete_account_wrong_password() {
        let user = User::new("ada@example.com", Some(hash_password("secret1").unwrap()));
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_delete().never();

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(MockRoleRepository::new()),
            permissive_context(),
        );

        let err = service
            .delete_account(id, DeleteAccountRequest { password: "nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_super_admin_cannot_delete_self() {
        let user = User::new("root@example.com", Some(hash_password("secret1").unwrap()));
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_delete().never();

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(roles_returning(&["SuperAdmin"])),
            permissive_context(),
        );

        assert!(service
            .delete_account(id, DeleteAccountRequest { password: "secret1".into() })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_account() {
        let user = User::new("ada@example.com", Some(hash_password("secret1").unwrap()));
        let id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_delete().times(1).returning(|_| Ok(()));

        let service = UserServiceImpl::new(
            Arc::new(users),
            Arc::new(roles_returning(&["User"])),
            permissive_context(),
        );

        service
            .delete_account(id, DeleteAccountRequest { password: "secret1".into() })
            .await
            .unwrap();
    }
}
