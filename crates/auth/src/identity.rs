use serde::{Deserialize, Serialize};

use storekeep_core::{RoleId, UserId};

use crate::{Permission, RoleName};

/// A resolved user: account, single role, and that role's permissions.
///
/// Built once per login by the identity store (user → role → permissions)
/// and embedded verbatim into the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub role_id: RoleId,
    pub role: RoleName,
    permissions: Vec<Permission>,
}

impl Identity {
    /// Duplicate permissions are dropped, first occurrence wins.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        display_name: impl Into<String>,
        role_id: RoleId,
        role: RoleName,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            display_name: display_name.into(),
            role_id,
            role,
            permissions: dedup_permissions(permissions),
        }
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

pub(crate) fn dedup_permissions(perms: impl IntoIterator<Item = Permission>) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for perm in perms {
        if !out.contains(&perm) {
            out.push(perm);
        }
    }
    out
}
