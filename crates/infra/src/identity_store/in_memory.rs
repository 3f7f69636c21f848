use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use storekeep_auth::{Identity, Permission, RoleName, roles};
use storekeep_core::{RoleId, UserId};

use super::{CredentialRecord, IdentityStore, IdentityStoreError};

/// Account to insert into an [`InMemoryIdentityStore`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: RoleName,
    pub permissions: Vec<Permission>,
    pub active: bool,
}

#[derive(Debug, Clone)]
struct UserRow {
    id: UserId,
    username: String,
    display_name: String,
    password_hash: String,
    role_id: RoleId,
    active: bool,
    last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct RoleRow {
    name: RoleName,
    permissions: Vec<Permission>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserRow>,
    roles: HashMap<RoleId, RoleRow>,
}

/// In-memory identity store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    inner: RwLock<Tables>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one active `super-admin` with every catalogue permission.
    pub fn with_super_admin(
        username: &str,
        password_hash: String,
    ) -> Result<(Self, UserId), IdentityStoreError> {
        let store = Self::new();
        let id = store.insert_user(NewUser {
            username: username.to_string(),
            display_name: "Super Admin".to_string(),
            password_hash,
            role: roles::SUPER_ADMIN,
            permissions: roles::default_role_permissions(roles::SUPER_ADMIN.as_str()),
            active: true,
        })?;
        Ok((store, id))
    }

    /// Insert a user. Users sharing a role name share one role row, whose
    /// permissions are replaced by the latest insert.
    pub fn insert_user(&self, user: NewUser) -> Result<UserId, IdentityStoreError> {
        let mut tables = self.write()?;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(IdentityStoreError::Storage(format!(
                "username already exists: {}",
                user.username
            )));
        }

        let role_id = tables
            .roles
            .iter()
            .find(|(_, r)| r.name == user.role)
            .map(|(id, _)| *id)
            .unwrap_or_default();
        tables.roles.insert(
            role_id,
            RoleRow {
                name: user.role,
                permissions: user.permissions,
            },
        );

        let id = UserId::new();
        tables.users.insert(
            id,
            UserRow {
                id,
                username: user.username,
                display_name: user.display_name,
                password_hash: user.password_hash,
                role_id,
                active: user.active,
                last_login_at: None,
            },
        );
        Ok(id)
    }

    pub fn set_active(&self, user_id: UserId, active: bool) -> Result<(), IdentityStoreError> {
        let mut tables = self.write()?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(IdentityStoreError::UserNotFound(user_id))?;
        user.active = active;
        Ok(())
    }

    pub fn last_login(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .ok()?
            .users
            .get(&user_id)
            .and_then(|u| u.last_login_at)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, IdentityStoreError> {
        self.inner
            .read()
            .map_err(|_| IdentityStoreError::Storage("identity store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, IdentityStoreError> {
        self.inner
            .write()
            .map_err(|_| IdentityStoreError::Storage("identity store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, IdentityStoreError> {
        let tables = self.read()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| CredentialRecord {
                user_id: u.id,
                username: u.username.clone(),
                password_hash: u.password_hash.clone(),
                active: u.active,
            }))
    }

    async fn resolve_identity(&self, user_id: UserId) -> Result<Identity, IdentityStoreError> {
        let tables = self.read()?;
        let user = tables
            .users
            .get(&user_id)
            .ok_or(IdentityStoreError::UserNotFound(user_id))?;
        let role = tables
            .roles
            .get(&user.role_id)
            .ok_or_else(|| IdentityStoreError::Inconsistent {
                user_id,
                reason: "role missing".to_string(),
            })?;

        Ok(Identity::new(
            user.id,
            user.username.clone(),
            user.display_name.clone(),
            user.role_id,
            role.name.clone(),
            role.permissions.iter().cloned(),
        ))
    }

    async fn touch_last_login(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), IdentityStoreError> {
        let mut tables = self.write()?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(IdentityStoreError::UserNotFound(user_id))?;
        user.last_login_at = Some(at);
        Ok(())
    }
}
