use chrono::{DateTime, Utc};

use storekeep_auth::{Claims, Permission, RoleName};
use storekeep_core::{RoleId, UserId};

/// Caller context for a request (verified token claims).
///
/// Inserted by the auth middleware; immutable for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    claims: Claims,
}

impl AuthContext {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn display_name(&self) -> &str {
        &self.claims.name
    }

    pub fn role_id(&self) -> RoleId {
        self.claims.role_id
    }

    pub fn role(&self) -> &RoleName {
        &self.claims.role
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.claims.permissions
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.claims.has_permission(permission)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
