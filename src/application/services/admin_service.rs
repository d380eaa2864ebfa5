//! Admin Service
//!
//! User administration behind the `users.*` permissions. Every mutation
//! is audited and evicts the target's cached stamp and profile.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{AccountContext, Actor};
use crate::application::dto::request::{
    AssignRoleRequest, CreateUserRequest, LockUserRequest, UserListParams,
};
use crate::application::dto::response::{AdminUserResponse, AuditEventsResponse};
use crate::domain::{
    entity_types, normalize_email, AuditAction, EmailTokenPurpose, RefreshTokenRepository, Role,
    RoleRepository, SystemRole, User, UserRepository,
};
use crate::infrastructure::email::templates;
use crate::shared::error::AppError;
use crate::shared::pagination::{PaginatedResponse, PaginationQuery};

/// Admin service trait for dependency injection
#[async_trait]
pub trait AdminService: Send + Sync {
    async fn list_users(
        &self,
        actor: &Actor,
        params: UserListParams,
    ) -> Result<PaginatedResponse<AdminUserResponse>, AppError>;

    async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<AdminUserResponse, AppError>;

    /// Create a passwordless account and email an invitation to set one.
    async fn create_user(
        &self,
        actor: &Actor,
        req: CreateUserRequest,
    ) -> Result<AdminUserResponse, AppError>;

    async fn lock_user(&self, actor: &Actor, id: Uuid, req: LockUserRequest)
        -> Result<(), AppError>;

    async fn unlock_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError>;

    async fn delete_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError>;

    async fn verify_email(&self, actor: &Actor, id: Uuid) -> Result<(), AppError>;

    async fn send_password_reset(&self, actor: &Actor, id: Uuid) -> Result<(), AppError>;

    async fn assign_role(
        &self,
        actor: &Actor,
        id: Uuid,
        req: AssignRoleRequest,
    ) -> Result<(), AppError>;

    async fn remove_role(&self, actor: &Actor, id: Uuid, role: &str) -> Result<(), AppError>;

    async fn user_audit(
        &self,
        actor: &Actor,
        id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError>;
}

/// AdminService implementation
pub struct AdminServiceImpl<U, R, T>
where
    U: UserRepository,
    R: RoleRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    refresh_repo: Arc<T>,
    ctx: AccountContext,
}

impl<U, R, T> AdminServiceImpl<U, R, T>
where
    U: UserRepository,
    R: RoleRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        role_repo: Arc<R>,
        refresh_repo: Arc<T>,
        ctx: AccountContext,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            refresh_repo,
            ctx,
        }
    }

    async fn load_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    async fn load_role(&self, name: &str) -> Result<Role, AppError> {
        self.role_repo
            .find_by_name(name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role '{}' not found.", name.trim())))
    }

    /// Load a user the actor is allowed to modify.
    async fn load_target(&self, actor: &Actor, id: Uuid) -> Result<(User, Vec<String>), AppError> {
        let user = self.load_user(id).await?;
        let roles = self.role_repo.user_roles(id).await?;

        let target_is_super = roles.iter().any(|r| r == SystemRole::SuperAdmin.as_str());
        if target_is_super && !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "Only a SuperAdmin can manage a SuperAdmin account.".into(),
            ));
        }
        Ok((user, roles))
    }

    fn present(&self, actor: &Actor, user: User, roles: Vec<String>) -> AdminUserResponse {
        let own = user.id == actor.user_id;
        let response = AdminUserResponse::new(user, roles);
        if self.ctx.settings.demo.enabled && !own {
            response.anonymized()
        } else {
            response
        }
    }

    async fn audit(
        &self,
        actor: &Actor,
        action: AuditAction,
        target: Uuid,
        metadata: Option<serde_json::Value>,
    ) {
        self.ctx
            .audit
            .log(
                Some(actor.user_id),
                action,
                Some(entity_types::USER),
                Some(target),
                metadata,
            )
            .await;
    }

    /// Force the user to sign in again with fresh claims.
    async fn revalidate(&self, id: Uuid) -> Result<(), AppError> {
        self.user_repo.rotate_security_stamps(&[id]).await?;
        self.ctx.evict_users(&[id]).await;
        Ok(())
    }
}

fn reject_self(actor: &Actor, id: Uuid, message: &str) -> Result<(), AppError> {
    if actor.user_id == id {
        return Err(AppError::BadRequest(message.into()));
    }
    Ok(())
}

#[async_trait]
impl<U, R, T> AdminService for AdminServiceImpl<U, R, T>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    T: RefreshTokenRepository + 'static,
{
    async fn list_users(
        &self,
        actor: &Actor,
        params: UserListParams,
    ) -> Result<PaginatedResponse<AdminUserResponse>, AppError> {
        let page = params.pagination();
        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let (users, total) = self
            .user_repo
            .list(search, page.limit(), page.offset())
            .await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let mut roles_by_user: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (user_id, role) in self.role_repo.roles_for_users(&ids).await? {
            roles_by_user.entry(user_id).or_default().push(role);
        }

        let items = users
            .into_iter()
            .map(|u| {
                let roles = roles_by_user.remove(&u.id).unwrap_or_default();
                self.present(actor, u, roles)
            })
            .collect();

        Ok(PaginatedResponse::new(items, total, page))
    }

    async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<AdminUserResponse, AppError> {
        let user = self.load_user(id).await?;
        let roles = self.role_repo.user_roles(id).await?;
        Ok(self.present(actor, user, roles))
    }

    async fn create_user(
        &self,
        actor: &Actor,
        req: CreateUserRequest,
    ) -> Result<AdminUserResponse, AppError> {
        let email = normalize_email(&req.email);
        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let mut user = User::new(&email, None);
        user.first_name = req.first_name.filter(|s| !s.trim().is_empty());
        user.last_name = req.last_name.filter(|s| !s.trim().is_empty());
        let user = self.user_repo.create(&user).await?;

        let role = self.load_role(SystemRole::User.as_str()).await?;
        self.role_repo.assign(user.id, role.id).await?;

        let raw = self
            .ctx
            .email_tokens
            .create(
                user.id,
                user.security_stamp.clone(),
                EmailTokenPurpose::PasswordReset,
            )
            .await?;
        let message = templates::invitation(&self.ctx.settings.email, &user.email, &raw);
        self.ctx.deliver("invitation", message).await;

        info!(user_id = %user.id, created_by = %actor.user_id, "User created by admin");
        self.audit(actor, AuditAction::AdminCreateUser, user.id, None)
            .await;

        Ok(self.present(actor, user, vec![role.name]))
    }

    async fn lock_user(
        &self,
        actor: &Actor,
        id: Uuid,
        req: LockUserRequest,
    ) -> Result<(), AppError> {
        reject_self(actor, id, "You cannot lock your own account.")?;
        if req.lockout_end.is_some_and(|end| end <= Utc::now()) {
            return Err(AppError::Validation(
                "Lockout end must be in the future.".into(),
            ));
        }

        let (mut user, _) = self.load_target(actor, id).await?;
        user.lock(req.lockout_end);
        self.user_repo.update(&user).await?;

        self.refresh_repo.invalidate_all_for_user(id).await?;
        self.ctx.evict_users(&[id]).await;

        info!(user_id = %id, locked_by = %actor.user_id, "User locked");
        self.audit(
            actor,
            AuditAction::AdminLockUser,
            id,
            Some(serde_json::json!({ "lockout_end": user.lockout_end })),
        )
        .await;
        Ok(())
    }

    async fn unlock_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let (mut user, _) = self.load_target(actor, id).await?;
        user.unlock();
        user.updated_at = Some(Utc::now());
        self.user_repo.update(&user).await?;
        self.ctx.evict_users(&[id]).await;

        self.audit(actor, AuditAction::AdminUnlockUser, id, None)
            .await;
        Ok(())
    }

    async fn delete_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        reject_self(actor, id, "You cannot delete your own account.")?;

        let (user, _) = self.load_target(actor, id).await?;
        self.user_repo.delete(id).await?;
        self.ctx.evict_users(&[id]).await;

        info!(user_id = %id, deleted_by = %actor.user_id, "User deleted");
        self.audit(
            actor,
            AuditAction::AdminDeleteUser,
            id,
            Some(serde_json::json!({ "email": user.email })),
        )
        .await;
        Ok(())
    }

    async fn verify_email(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let (mut user, _) = self.load_target(actor, id).await?;
        if user.email_confirmed {
            return Err(AppError::BadRequest("Email is already verified.".into()));
        }

        user.email_confirmed = true;
        user.updated_at = Some(Utc::now());
        self.user_repo.update(&user).await?;
        self.ctx.evict_users(&[id]).await;

        self.audit(actor, AuditAction::AdminVerifyEmail, id, None)
            .await;
        Ok(())
    }

    async fn send_password_reset(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let (user, _) = self.load_target(actor, id).await?;

        let raw = self
            .ctx
            .email_tokens
            .create(
                user.id,
                user.security_stamp.clone(),
                EmailTokenPurpose::PasswordReset,
            )
            .await?;
        let message = templates::password_reset(&self.ctx.settings.email, &user.email, &raw);
        self.ctx.deliver("password_reset", message).await;

        self.audit(actor, AuditAction::AdminSendPasswordReset, id, None)
            .await;
        Ok(())
    }

    async fn assign_role(
        &self,
        actor: &Actor,
        id: Uuid,
        req: AssignRoleRequest,
    ) -> Result<(), AppError> {
        let role = self.load_role(&req.role).await?;
        if role.name == SystemRole::SuperAdmin.as_str() && !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "Only a SuperAdmin can grant the SuperAdmin role.".into(),
            ));
        }

        let (_, roles) = self.load_target(actor, id).await?;
        if roles.iter().any(|r| r.eq_ignore_ascii_case(&role.name)) {
            return Err(AppError::Conflict("User already has this role".into()));
        }

        self.role_repo.assign(id, role.id).await?;
        self.revalidate(id).await?;

        info!(user_id = %id, role = %role.name, "Role assigned");
        self.audit(
            actor,
            AuditAction::AdminAssignRole,
            id,
            Some(serde_json::json!({ "role": role.name })),
        )
        .await;
        Ok(())
    }

    async fn remove_role(&self, actor: &Actor, id: Uuid, role: &str) -> Result<(), AppError> {
        reject_self(actor, id, "You cannot remove roles from your own account.")?;

        let role = self.load_role(role).await?;
        self.load_target(actor, id).await?;

        if !self.role_repo.remove(id, role.id).await? {
            return Err(AppError::NotFound("User does not have this role.".into()));
        }
        self.revalidate(id).await?;

        info!(user_id = %id, role = %role.name, "Role removed");
        self.audit(
            actor,
            AuditAction::AdminRemoveRole,
            id,
            Some(serde_json::json!({ "role": role.name })),
        )
        .await;
        Ok(())
    }

    async fn user_audit(
        &self,
        _actor: &Actor,
        id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError> {
        self.load_user(id).await?;
        self.ctx.audit.user_events(id, page).await
    }
}
