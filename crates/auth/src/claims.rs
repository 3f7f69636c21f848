use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storekeep_core::{RoleId, UserId};

use crate::{Permission, RoleName};

/// Token payload (flat JSON, signed but not encrypted).
///
/// Everything here is readable by anyone holding the token, so nothing
/// secret may be placed in the names or permission strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    pub username: String,
    /// Display name.
    pub name: String,
    pub role_id: RoleId,
    pub role: RoleName,
    pub permissions: Vec<Permission>,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expires-at, Unix seconds.
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Unique token id, fresh for every issued token.
    pub jti: String,
    /// Session started at, Unix seconds. Set at login, copied on refresh.
    pub sst: i64,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        from_unix(self.iat)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        from_unix(self.exp)
    }

    pub fn session_started_at(&self) -> DateTime<Utc> {
        from_unix(self.sst)
    }

    /// Instant from which the token may be exchanged for a fresh one.
    pub fn refresh_at(&self, threshold: Duration) -> DateTime<Utc> {
        self.expires_at()
            .checked_sub_signed(threshold)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A token is live strictly before `exp`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_str() == role
    }
}

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time fields of a claim set.
///
/// Signature verification happens in the codec; this looks at time only.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if claims.is_expired(now) {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn live_until_the_second_before_exp() {
        let now = test_time();
        let claims = sample_claims(now);
        let exp = claims.expires_at();

        assert_eq!(validate_claims(&claims, exp - Duration::seconds(1)), Ok(()));
        assert_eq!(
            validate_claims(&claims, exp),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, exp + Duration::seconds(1)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = test_time();
        let mut claims = sample_claims(now);
        claims.exp = claims.iat;
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn refresh_at_is_exp_minus_threshold() {
        let claims = sample_claims(test_time());
        assert_eq!(
            claims.refresh_at(Duration::minutes(2)),
            test_time() + Duration::minutes(8)
        );
    }

    #[test]
    fn role_and_permission_checks_are_exact() {
        let claims = sample_claims(test_time());
        assert!(claims.has_permission("orders-read"));
        assert!(!claims.has_permission("orders-write"));
        assert!(!claims.has_permission("Orders-Read"));
        assert!(claims.has_role("employee"));
        assert!(!claims.has_role("Employee"));
    }
}
