//! Service wiring for the identity flows (login, refresh, logout).
//!
//! Handlers stay thin: everything that touches the identity store, bcrypt or
//! the token issuer goes through [`AppServices`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storekeep_auth::{
    AuthConfig, Claims, Denylist, Identity, InMemoryDenylist, IssueError, IssuedToken, KeyLookup,
    PasswordError, PasswordHasher, RefreshError, RefreshPolicy, TokenCodec, TokenIssuer,
    TokenSettings, TokenVerifier,
};
use storekeep_core::UserId;
use storekeep_infra::{IdentityStore, IdentityStoreError};

/// Upper bound for the fire-and-forget last-login update.
pub const LAST_LOGIN_TIMEOUT: StdDuration = StdDuration::from_secs(2);

/// Verified against when the username is unknown so both paths pay for one
/// bcrypt verification.
const DUMMY_PASSWORD: &str = "storekeep-dummy-password";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown user or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user inactive")]
    Inactive,

    #[error(transparent)]
    Store(#[from] IdentityStoreError),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A successful login: who logged in and the token they received.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub issued: IssuedToken,
}

pub struct AppServices {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    dummy_digest: String,
    issuer: TokenIssuer,
    verifier: Arc<TokenVerifier>,
    refresh: RefreshPolicy,
    denylist: Option<Arc<dyn Denylist>>,
}

impl AppServices {
    pub fn build(config: &AuthConfig, store: Arc<dyn IdentityStore>) -> Result<Self, BuildError> {
        let codec = TokenCodec::with_key_ring(config.keys.clone());
        let issuer = TokenIssuer::new(codec.clone(), config.tokens.clone());

        let denylist: Option<Arc<dyn Denylist>> = config
            .denylist_enabled
            .then(|| Arc::new(InMemoryDenylist::new()) as Arc<dyn Denylist>);

        let mut verifier = TokenVerifier::new(codec, &config.tokens);
        if let Some(list) = &denylist {
            verifier = verifier.with_denylist(Arc::clone(list));
        }

        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let dummy_digest = hasher.hash(DUMMY_PASSWORD)?;

        tracing::info!(
            kid = config.keys.active().kid(),
            expiration_secs = config.tokens.expiration.num_seconds(),
            refresh_threshold_secs = config.tokens.refresh_threshold.num_seconds(),
            max_session_secs = config.tokens.max_session.map(|d| d.num_seconds()),
            denylist = config.denylist_enabled,
            "auth services configured"
        );

        Ok(Self {
            store,
            hasher,
            dummy_digest,
            refresh: RefreshPolicy::new(verifier.clone(), issuer.clone()),
            issuer,
            verifier: Arc::new(verifier),
            denylist,
        })
    }

    pub fn verifier(&self) -> Arc<TokenVerifier> {
        Arc::clone(&self.verifier)
    }

    pub fn token_settings(&self) -> &TokenSettings {
        self.issuer.settings()
    }

    pub fn denylist_enabled(&self) -> bool {
        self.denylist.is_some()
    }

    /// Authenticate `username`/`password` and mint a token.
    ///
    /// - Unknown user and wrong password both yield `InvalidCredentials`
    /// - `Inactive` is reported only after the password matched
    /// - Last-login is recorded in the background and never fails the login
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, LoginError> {
        let credential = self.store.find_credential(username).await?;

        let digest = credential
            .as_ref()
            .map(|c| c.password_hash.clone())
            .unwrap_or_else(|| self.dummy_digest.clone());
        let hasher = self.hasher;
        let candidate = password.to_owned();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&candidate, &digest))
            .await
            .map_err(|e| LoginError::Internal(format!("password verification task failed: {e}")))?;

        let credential = match credential {
            Some(c) if matched => c,
            Some(c) => {
                tracing::warn!(user_id = %c.user_id, username, reason = "wrong_password", "login rejected");
                return Err(LoginError::InvalidCredentials);
            }
            None => {
                tracing::warn!(username, reason = "unknown_user", "login rejected");
                return Err(LoginError::InvalidCredentials);
            }
        };

        if !credential.active {
            tracing::warn!(user_id = %credential.user_id, username, reason = "inactive", "login rejected");
            return Err(LoginError::Inactive);
        }

        let identity = self.store.resolve_identity(credential.user_id).await?;
        let issued = self.issuer.issue(&identity, now)?;

        self.record_last_login(identity.user_id, now);

        tracing::info!(
            user_id = %identity.user_id,
            username = identity.username.as_str(),
            role = identity.role.as_str(),
            "login succeeded"
        );

        Ok(LoginOutcome { identity, issued })
    }

    /// Exchange a still-valid token inside its refresh window.
    pub fn refresh(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedToken, RefreshError> {
        self.refresh.refresh(token, now)
    }

    /// Revoke the presented token when a denylist is configured.
    ///
    /// Returns whether the revocation is enforced.
    pub fn logout(&self, claims: &Claims, now: DateTime<Utc>) -> bool {
        match &self.denylist {
            Some(list) => {
                list.deny(&claims.jti, claims.expires_at(), now);
                tracing::info!(user_id = %claims.sub, "logout: token revoked");
                true
            }
            None => {
                tracing::info!(user_id = %claims.sub, "logout: advisory only, token stays valid until expiry");
                false
            }
        }
    }

    fn record_last_login(&self, user_id: UserId, at: DateTime<Utc>) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match tokio::time::timeout(LAST_LOGIN_TIMEOUT, store.touch_last_login(user_id, at)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(user_id = %user_id, error = %err, "failed to record last login");
                }
                Err(_) => {
                    tracing::warn!(user_id = %user_id, "recording last login timed out");
                }
            }
        });
    }
}
