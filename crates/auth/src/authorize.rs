use thiserror::Error;

use crate::Claims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    MissingPermission(String),

    #[error("forbidden: requires any of {0:?}")]
    MissingAnyPermission(Vec<String>),

    #[error("forbidden: requires role '{required}'")]
    RoleMismatch { required: String },
}

impl AuthzError {
    /// The permissions or role the caller lacked, in declaration order.
    pub fn required(&self) -> Vec<String> {
        match self {
            Self::MissingPermission(p) => vec![p.clone()],
            Self::MissingAnyPermission(ps) => ps.clone(),
            Self::RoleMismatch { required } => vec![required.clone()],
        }
    }
}

/// Require one exact permission on the verified claims.
///
/// - No IO
/// - No panics
/// - No wildcard or prefix matching
pub fn require_permission(claims: &Claims, required: &str) -> Result<(), AuthzError> {
    if claims.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::MissingPermission(required.to_string()))
    }
}

/// Require at least one of `required`. An empty list never grants access.
pub fn require_any_permission(claims: &Claims, required: &[&str]) -> Result<(), AuthzError> {
    if required.iter().any(|p| claims.has_permission(p)) {
        Ok(())
    } else {
        Err(AuthzError::MissingAnyPermission(
            required.iter().map(|p| p.to_string()).collect(),
        ))
    }
}

/// Require the role name to match exactly (case-sensitive).
pub fn require_role(claims: &Claims, required: &str) -> Result<(), AuthzError> {
    if claims.has_role(required) {
        Ok(())
    } else {
        Err(AuthzError::RoleMismatch {
            required: required.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::test_support::{sample_claims, test_time};
    use crate::permissions::catalog;
    use crate::roles;

    #[test]
    fn permission_present_is_granted() {
        let claims = sample_claims(test_time());
        assert!(require_permission(&claims, "orders-read").is_ok());
    }

    #[test]
    fn matching_is_exact() {
        let claims = sample_claims(test_time());

        assert_eq!(
            require_permission(&claims, "orders-write"),
            Err(AuthzError::MissingPermission("orders-write".to_string()))
        );
        assert!(require_permission(&claims, "Orders-Read").is_err());
        assert!(require_permission(&claims, "orders").is_err());
        assert!(require_permission(&claims, "orders-read ").is_err());
    }

    #[test]
    fn any_permission_needs_one_match() {
        let claims = sample_claims(test_time());

        assert!(require_any_permission(&claims, &["reports-read", "inventory-read"]).is_ok());

        let err = require_any_permission(&claims, &["reports-read", "expenses-read"]).unwrap_err();
        assert_eq!(err.required(), vec!["reports-read", "expenses-read"]);
    }

    #[test]
    fn any_permission_with_empty_list_is_denied() {
        let claims = sample_claims(test_time());
        assert!(require_any_permission(&claims, &[]).is_err());
    }

    #[test]
    fn role_gate_is_case_sensitive() {
        let mut claims = sample_claims(test_time());
        assert!(require_role(&claims, "employee").is_ok());
        assert!(require_role(&claims, "Employee").is_err());

        claims.role = roles::SUPER_ADMIN;
        assert!(require_role(&claims, "super-admin").is_ok());
        assert_eq!(
            require_role(&claims, "admin"),
            Err(AuthzError::RoleMismatch {
                required: "admin".to_string()
            })
        );
    }

    #[test]
    fn super_admin_gets_no_implicit_bypass() {
        let mut claims = sample_claims(test_time());
        claims.role = roles::SUPER_ADMIN;
        claims.permissions = vec![catalog::INVENTORY_READ];

        assert!(require_permission(&claims, "users-manage").is_err());
    }
}
