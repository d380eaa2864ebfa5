//! Role Service
//!
//! Role CRUD and permission assignment. Any change that alters what a
//! role grants rotates the security stamps of its members so their
//! access tokens are re-issued with the new claims.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{AccountContext, Actor};
use crate::application::dto::request::{CreateRoleRequest, SetPermissionsRequest, UpdateRoleRequest};
use crate::application::dto::response::{PermissionGroupResponse, RoleDetailResponse, RoleResponse};
use crate::domain::{
    entity_types, is_known_permission, permission_groups, AuditAction, Role, RoleRepository,
    SystemRole, UserRepository,
};
use crate::shared::error::AppError;

/// Role service trait for dependency injection
#[async_trait]
pub trait RoleService: Send + Sync {
    async fn list(&self) -> Result<Vec<RoleResponse>, AppError>;

    async fn get(&self, id: Uuid) -> Result<RoleDetailResponse, AppError>;

    async fn create(&self, actor: &Actor, req: CreateRoleRequest)
        -> Result<RoleDetailResponse, AppError>;

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        req: UpdateRoleRequest,
    ) -> Result<RoleDetailResponse, AppError>;

    /// Custom roles with no members only.
    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError>;

    async fn set_permissions(
        &self,
        actor: &Actor,
        id: Uuid,
        req: SetPermissionsRequest,
    ) -> Result<RoleDetailResponse, AppError>;

    fn permission_groups(&self) -> Vec<PermissionGroupResponse>;
}

/// RoleService implementation
pub struct RoleServiceImpl<R, U>
where
    R: RoleRepository,
    U: UserRepository,
{
    role_repo: Arc<R>,
    user_repo: Arc<U>,
    ctx: AccountContext,
}

impl<R, U> RoleServiceImpl<R, U>
where
    R: RoleRepository,
    U: UserRepository,
{
    pub fn new(role_repo: Arc<R>, user_repo: Arc<U>, ctx: AccountContext) -> Self {
        Self {
            role_repo,
            user_repo,
            ctx,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Role, AppError> {
        self.role_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found.".into()))
    }

    async fn detail(&self, role: Role) -> Result<RoleDetailResponse, AppError> {
        let permissions = self.role_repo.permissions(role.id).await?;
        let user_count = self.role_repo.count_users(role.id).await?;
        Ok(RoleDetailResponse::new(role, permissions, user_count))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), AppError> {
        if let Some(existing) = self.role_repo.find_by_name(name).await? {
            if Some(existing.id) != except {
                return Err(AppError::Conflict(format!("Role '{}' already exists.", name)));
            }
        }
        Ok(())
    }

    /// Rotate stamps of every member of the role and drop their caches.
    async fn revalidate_members(&self, role_id: Uuid) -> Result<usize, AppError> {
        let members = self.role_repo.user_ids_in_role(role_id).await?;
        if members.is_empty() {
            return Ok(0);
        }
        self.user_repo.rotate_security_stamps(&members).await?;
        self.ctx.evict_users(&members).await;
        Ok(members.len())
    }

    async fn audit(
        &self,
        actor: &Actor,
        action: AuditAction,
        role_id: Uuid,
        metadata: Option<serde_json::Value>,
    ) {
        self.ctx
            .audit
            .log(
                Some(actor.user_id),
                action,
                Some(entity_types::ROLE),
                Some(role_id),
                metadata,
            )
            .await;
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[async_trait]
impl<R, U> RoleService for RoleServiceImpl<R, U>
where
    R: RoleRepository + 'static,
    U: UserRepository + 'static,
{
    async fn list(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.role_repo.list_with_counts().await?;
        Ok(roles.into_iter().map(RoleResponse::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<RoleDetailResponse, AppError> {
        let role = self.load(id).await?;
        self.detail(role).await
    }

    async fn create(
        &self,
        actor: &Actor,
        req: CreateRoleRequest,
    ) -> Result<RoleDetailResponse, AppError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required.".into()));
        }
        self.ensure_name_free(&name, None).await?;

        let role = Role::new(name, clean_description(req.description));
        let role = self.role_repo.create(&role).await?;

        info!(role_id = %role.id, name = %role.name, "Role created");
        self.audit(
            actor,
            AuditAction::AdminCreateRole,
            role.id,
            Some(serde_json::json!({ "name": role.name })),
        )
        .await;

        Ok(RoleDetailResponse::new(role, vec![], 0))
    }

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        req: UpdateRoleRequest,
    ) -> Result<RoleDetailResponse, AppError> {
        let mut role = self.load(id).await?;

        if let Some(name) = req.name.map(|n| n.trim().to_string()) {
            if name != role.name {
                if role.is_system {
                    return Err(AppError::Validation(
                        "System roles cannot be renamed.".into(),
                    ));
                }
                if name.is_empty() {
                    return Err(AppError::Validation("Name is required.".into()));
                }
                self.ensure_name_free(&name, Some(id)).await?;
                role.name = name;
            }
        }
        if req.description.is_some() {
            role.description = clean_description(req.description);
        }

        let role = self.role_repo.update(&role).await?;
        // Role names travel in access token claims.
        self.revalidate_members(id).await?;

        self.audit(
            actor,
            AuditAction::AdminUpdateRole,
            id,
            Some(serde_json::json!({ "name": role.name })),
        )
        .await;

        self.detail(role).await
    }

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let role = self.load(id).await?;
        if role.is_system {
            return Err(AppError::Validation("System roles cannot be deleted.".into()));
        }

        let user_count = self.role_repo.count_users(id).await?;
        if user_count > 0 {
            return Err(AppError::Validation(format!(
                "Role is assigned to {} user(s) and cannot be deleted.",
                user_count
            )));
        }

        self.role_repo.delete(id).await?;

        info!(role_id = %id, name = %role.name, "Role deleted");
        self.audit(
            actor,
            AuditAction::AdminDeleteRole,
            id,
            Some(serde_json::json!({ "name": role.name })),
        )
        .await;
        Ok(())
    }

    async fn set_permissions(
        &self,
        actor: &Actor,
        id: Uuid,
        req: SetPermissionsRequest,
    ) -> Result<RoleDetailResponse, AppError> {
        let role = self.load(id).await?;
        if role.name == SystemRole::SuperAdmin.as_str() {
            return Err(AppError::Validation(
                "SuperAdmin permissions cannot be changed.".into(),
            ));
        }

        let mut permissions: Vec<String> = req
            .permissions
            .into_iter()
            .map(|p| p.trim().to_string())
            .collect();
        if let Some(unknown) = permissions.iter().find(|p| !is_known_permission(p)) {
            return Err(AppError::Validation(format!(
                "Unknown permission '{}'.",
                unknown
            )));
        }
        permissions.sort();
        permissions.dedup();

        self.role_repo.set_permissions(id, &permissions).await?;
        let affected = self.revalidate_members(id).await?;

        info!(role_id = %id, affected_users = affected, "Role permissions updated");
        self.audit(
            actor,
            AuditAction::AdminSetRolePermissions,
            id,
            Some(serde_json::json!({ "permissions": permissions })),
        )
        .await;

        self.detail(role).await
    }

    fn permission_groups(&self) -> Vec<PermissionGroupResponse> {
        permission_groups()
            .into_iter()
            .map(PermissionGroupResponse::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::permissive_context;
    use crate::domain::{permissions, MockRoleRepository, MockUserRepository, RoleWithCount};
    use chrono::Utc;
    use mockall::predicate::*;

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), vec!["Admin".into()])
    }

    fn role(name: &str, is_system: bool) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            is_system,
            created_at: Utc::now(),
        }
    }

    fn repo_with(role: Role) -> MockRoleRepository {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(role.clone())));
        repo
    }

    #[tokio::test]
    async fn test_list_includes_user_counts() {
        let mut repo = MockRoleRepository::new();
        repo.expect_list_with_counts().returning(|| {
            Ok(vec![RoleWithCount {
                role: role("Admin", true),
                user_count: 3,
            }])
        });

        let service = RoleServiceImpl::new(
            Arc::new(repo),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let roles = service.list().await.unwrap();
        assert_eq!(roles[0].user_count, 3);
        assert!(roles[0].is_system);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Ok(Some(role("Support", false))));
        repo.expect_create().never();

        let service = RoleServiceImpl::new(
            Arc::new(repo),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let err = service
            .create(
                &actor(),
                CreateRoleRequest {
                    name: "Support".into(),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_system_role_cannot_be_deleted() {
        let service = RoleServiceImpl::new(
            Arc::new(repo_with(role("Admin", true))),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let err = service.delete(&actor(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_role_in_use_cannot_be_deleted() {
        let mut repo = repo_with(role("Support", false));
        repo.expect_count_users().returning(|_| Ok(2));
        repo.expect_delete().never();

        let service = RoleServiceImpl::new(
            Arc::new(repo),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        assert!(matches!(
            service.delete(&actor(), Uuid::new_v4()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_system_role_cannot_be_renamed() {
        let service = RoleServiceImpl::new(
            Arc::new(repo_with(role("User", true))),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let err = service
            .update(
                &actor(),
                Uuid::new_v4(),
                UpdateRoleRequest {
                    name: Some("Member".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_permission_rejected() {
        let mut repo = repo_with(role("Support", false));
        repo.expect_set_permissions().never();

        let service = RoleServiceImpl::new(
            Arc::new(repo),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let err = service
            .set_permissions(
                &actor(),
                Uuid::new_v4(),
                SetPermissionsRequest {
                    permissions: vec!["users.view".into(), "rockets.launch".into()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("rockets.launch")));
    }

    #[tokio::test]
    async fn test_super_admin_permissions_are_fixed() {
        let service = RoleServiceImpl::new(
            Arc::new(repo_with(role("SuperAdmin", true))),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        assert!(service
            .set_permissions(
                &actor(),
                Uuid::new_v4(),
                SetPermissionsRequest {
                    permissions: vec![]
                },
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_permissions_rotates_member_stamps() {
        let target = role("Support", false);
        let id = target.id;
        let members = vec![Uuid::new_v4(), Uuid::new_v4()];
        let expected = members.clone();

        let mut repo = repo_with(target);
        repo.expect_set_permissions()
            .withf(|_, perms| perms.len() == 1 && perms[0] == permissions::USERS_VIEW)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_user_ids_in_role()
            .with(eq(id))
            .returning(move |_| Ok(members.clone()));
        repo.expect_permissions()
            .returning(|_| Ok(vec![permissions::USERS_VIEW.to_string()]));
        repo.expect_count_users().returning(|_| Ok(2));

        let mut users = MockUserRepository::new();
        users
            .expect_rotate_security_stamps()
            .withf(move |ids| ids == expected.as_slice())
            .times(1)
            .returning(|_| Ok(()));

        let service = RoleServiceImpl::new(Arc::new(repo), Arc::new(users), permissive_context());
        let detail = service
            .set_permissions(
                &actor(),
                id,
                SetPermissionsRequest {
                    permissions: vec![
                        permissions::USERS_VIEW.into(),
                        permissions::USERS_VIEW.into(),
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.permissions, vec![permissions::USERS_VIEW.to_string()]);
        assert_eq!(detail.user_count, 2);
    }

    #[test]
    fn test_permission_groups() {
        let service = RoleServiceImpl::new(
            Arc::new(MockRoleRepository::new()),
            Arc::new(MockUserRepository::new()),
            permissive_context(),
        );
        let groups = service.permission_groups();
        assert_eq!(groups.len(), 3);
    }
}
