//! Token issuance for the identity service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::codec::{CodecError, TokenCodec};
use crate::config::TokenSettings;
use crate::identity::dedup_permissions;
use crate::{Claims, Identity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("identity has no role")]
    MissingRole,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<CodecError> for IssueError {
    fn from(err: CodecError) -> Self {
        Self::Signing(err.to_string())
    }
}

/// A freshly signed token and its timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(skip)]
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
    pub refresh_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    settings: TokenSettings,
}

impl TokenIssuer {
    pub fn new(codec: TokenCodec, settings: TokenSettings) -> Self {
        Self { codec, settings }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Mint a token for a freshly authenticated identity.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, IssueError> {
        if identity.role.is_blank() {
            return Err(IssueError::MissingRole);
        }

        let claims = Claims {
            sub: identity.user_id,
            username: identity.username.clone(),
            name: identity.display_name.clone(),
            role_id: identity.role_id,
            role: identity.role.clone(),
            permissions: dedup_permissions(identity.permissions().iter().cloned()),
            iat: 0,
            exp: 0,
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            jti: String::new(),
            sst: now.timestamp(),
        };
        self.sign(claims, now)
    }

    /// Same identity, role and permissions (copied, not re-resolved) with a
    /// new issue time, expiry and token id. The session start is kept.
    pub fn reissue(&self, previous: &Claims, now: DateTime<Utc>) -> Result<IssuedToken, IssueError> {
        self.sign(previous.clone(), now)
    }

    fn sign(&self, mut claims: Claims, now: DateTime<Utc>) -> Result<IssuedToken, IssueError> {
        let expires_at = now
            .checked_add_signed(self.settings.expiration)
            .ok_or_else(|| IssueError::Signing("expiry is out of the representable range".into()))?;
        claims.iat = now.timestamp();
        claims.exp = expires_at.timestamp();
        claims.jti = uuid::Uuid::now_v7().to_string();

        let token = self.codec.encode(&claims)?;
        let refresh_at = claims.refresh_at(self.settings.refresh_threshold);
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
            refresh_at,
            claims,
        })
    }
}
