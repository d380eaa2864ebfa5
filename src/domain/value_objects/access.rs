//! Permission strings and system roles.
//!
//! Permissions are plain strings stored per role. SuperAdmin holds every
//! permission implicitly and its set cannot be edited.

use serde::Serialize;

pub mod permissions {
    pub const USERS_VIEW: &str = "users.view";
    pub const USERS_MANAGE: &str = "users.manage";
    pub const USERS_ASSIGN_ROLES: &str = "users.assign_roles";
    pub const ROLES_VIEW: &str = "roles.view";
    pub const ROLES_MANAGE: &str = "roles.manage";
    pub const JOBS_VIEW: &str = "jobs.view";
    pub const JOBS_MANAGE: &str = "jobs.manage";
}

/// A named group of permissions for display in the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGroup {
    pub category: &'static str,
    pub permissions: Vec<&'static str>,
}

const GROUPS: &[(&str, &[&str])] = &[
    (
        "Users",
        &[
            permissions::USERS_VIEW,
            permissions::USERS_MANAGE,
            permissions::USERS_ASSIGN_ROLES,
        ],
    ),
    ("Roles", &[permissions::ROLES_VIEW, permissions::ROLES_MANAGE]),
    ("Jobs", &[permissions::JOBS_VIEW, permissions::JOBS_MANAGE]),
];

/// All permissions grouped by category.
pub fn permission_groups() -> Vec<PermissionGroup> {
    GROUPS
        .iter()
        .map(|(category, perms)| PermissionGroup {
            category,
            permissions: perms.to_vec(),
        })
        .collect()
}

/// Every defined permission.
pub fn all_permissions() -> Vec<&'static str> {
    GROUPS.iter().flat_map(|(_, perms)| perms.iter().copied()).collect()
}

pub fn is_known_permission(permission: &str) -> bool {
    GROUPS
        .iter()
        .any(|(_, perms)| perms.contains(&permission))
}

/// Built-in roles, highest rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemRole {
    SuperAdmin,
    Admin,
    User,
}

impl SystemRole {
    pub const ALL: [SystemRole; 3] = [Self::SuperAdmin, Self::Admin, Self::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SuperAdmin",
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Higher outranks lower. Custom roles rank 0.
    pub fn rank(&self) -> u8 {
        match self {
            Self::SuperAdmin => 3,
            Self::Admin => 2,
            Self::User => 1,
        }
    }
}

/// Highest rank among role names. Unknown names count as 0.
pub fn highest_rank<S: AsRef<str>>(roles: &[S]) -> u8 {
    roles
        .iter()
        .filter_map(|r| SystemRole::from_name(r.as_ref()))
        .map(|r| r.rank())
        .max()
        .unwrap_or(0)
}

/// Effective permissions: SuperAdmin expands to all, others keep theirs.
pub fn effective_permissions<S: AsRef<str>>(roles: &[S], granted: Vec<String>) -> Vec<String> {
    if roles
        .iter()
        .any(|r| r.as_ref() == SystemRole::SuperAdmin.as_str())
    {
        return all_permissions().into_iter().map(String::from).collect();
    }

    let mut granted = granted;
    granted.sort();
    granted.dedup();
    granted
}
