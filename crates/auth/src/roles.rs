use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::{Permission, catalog};

/// Role name carried in a token.
///
/// A token carries exactly one role. Roles do not imply each other: if an
/// admin should be able to do everything an employee can, the admin role is
/// granted every employee permission explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const SUPER_ADMIN: RoleName = RoleName::from_static("super-admin");
pub const ADMIN: RoleName = RoleName::from_static("admin");
pub const EMPLOYEE: RoleName = RoleName::from_static("employee");

/// Permissions granted to an employee.
pub fn employee_permissions() -> Vec<Permission> {
    vec![
        catalog::INVENTORY_READ,
        catalog::ORDERS_READ,
        catalog::ORDERS_WRITE,
    ]
}

/// Permissions granted to an admin: every employee permission, listed
/// explicitly, plus management permissions.
pub fn admin_permissions() -> Vec<Permission> {
    let mut perms = employee_permissions();
    perms.extend([
        catalog::INVENTORY_WRITE,
        catalog::EXPENSES_READ,
        catalog::EXPENSES_WRITE,
        catalog::REPORTS_READ,
    ]);
    perms
}

/// Default role → permission mapping used to seed identity stores.
pub fn default_role_permissions(role: &str) -> Vec<Permission> {
    match role {
        "super-admin" => catalog::all(),
        "admin" => admin_permissions(),
        "employee" => employee_permissions(),
        _ => Vec::new(),
    }
}

/// Every role with a default grant, in display order.
pub fn default_roles() -> Vec<RoleName> {
    vec![SUPER_ADMIN, ADMIN, EMPLOYEE]
}
