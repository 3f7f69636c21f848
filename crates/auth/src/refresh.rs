//! Refresh eligibility and reissue.
//!
//! A token can be exchanged only while it is still valid and within the
//! refresh window before its expiry. Expired tokens are never refreshed;
//! the client has to log in again. When a maximum session lifetime is
//! configured, a refresh chain also ends once that much time has passed
//! since the original login.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::issuer::{IssueError, IssuedToken, TokenIssuer};
use crate::verifier::{TokenVerifier, VerifyError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("token has expired; log in again")]
    Expired,

    #[error("token is not yet eligible for refresh (refresh after {refresh_at})")]
    NotYetEligible { refresh_at: DateTime<Utc> },

    #[error("session has reached its maximum lifetime; log in again")]
    SessionLimitReached,

    #[error("invalid token: {0}")]
    Invalid(VerifyError),

    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl From<VerifyError> for RefreshError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Expired => Self::Expired,
            other => Self::Invalid(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    verifier: TokenVerifier,
    issuer: TokenIssuer,
    threshold: Duration,
    max_session: Option<Duration>,
}

impl RefreshPolicy {
    /// Window and session ceiling are taken from the issuer's settings.
    pub fn new(verifier: TokenVerifier, issuer: TokenIssuer) -> Self {
        let threshold = issuer.settings().refresh_threshold;
        let max_session = issuer.settings().max_session;
        Self {
            verifier,
            issuer,
            threshold,
            max_session,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// `exp - now <= threshold`
    pub fn is_eligible(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        expires_at - now <= self.threshold
    }

    pub fn refresh(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedToken, RefreshError> {
        let claims = self.verifier.verify(token, now)?;

        let expires_at = claims.expires_at();
        if !self.is_eligible(expires_at, now) {
            return Err(RefreshError::NotYetEligible {
                refresh_at: claims.refresh_at(self.threshold),
            });
        }

        if let Some(max) = self.max_session {
            if now - claims.session_started_at() > max {
                return Err(RefreshError::SessionLimitReached);
            }
        }

        Ok(self.issuer.reissue(&claims, now)?)
    }
}
