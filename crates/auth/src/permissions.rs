use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque, case-sensitive strings (e.g. "inventory-read").
/// They are compared by exact string equality only: there is no wildcard
/// and no hierarchy, so `orders-read` never satisfies `orders-write`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

/// Permission catalogue for the store services.
pub mod catalog {
    use super::Permission;

    pub const INVENTORY_READ: Permission = Permission::from_static("inventory-read");
    pub const INVENTORY_WRITE: Permission = Permission::from_static("inventory-write");
    pub const ORDERS_READ: Permission = Permission::from_static("orders-read");
    pub const ORDERS_WRITE: Permission = Permission::from_static("orders-write");
    pub const EXPENSES_READ: Permission = Permission::from_static("expenses-read");
    pub const EXPENSES_WRITE: Permission = Permission::from_static("expenses-write");
    pub const REPORTS_READ: Permission = Permission::from_static("reports-read");
    pub const USERS_MANAGE: Permission = Permission::from_static("users-manage");

    /// Every permission known to the store services.
    pub fn all() -> Vec<Permission> {
        vec![
            INVENTORY_READ,
            INVENTORY_WRITE,
            ORDERS_READ,
            ORDERS_WRITE,
            EXPENSES_READ,
            EXPENSES_WRITE,
            REPORTS_READ,
            USERS_MANAGE,
        ]
    }
}
