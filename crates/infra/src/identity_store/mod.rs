//! Identity storage: credentials, user → role → permissions resolution, and
//! last-login bookkeeping.
//!
//! The auth library never talks to storage itself; the identity service
//! resolves an [`Identity`] here once per login and embeds it in the token.

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryIdentityStore, NewUser};
pub use postgres::PostgresIdentityStore;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storekeep_auth::Identity;
use storekeep_core::UserId;

/// What login needs before a password is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
    pub active: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityStoreError {
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// A user row without a role, or a role without a name.
    #[error("identity for user {user_id} is inconsistent: {reason}")]
    Inconsistent { user_id: UserId, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Identity store abstraction.
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a credential by exact username. `Ok(None)` when unknown.
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, IdentityStoreError>;

    /// Resolve the user's single role and that role's permissions.
    async fn resolve_identity(&self, user_id: UserId) -> Result<Identity, IdentityStoreError>;

    /// Record a successful login. Concurrent updates are last-write-wins.
    async fn touch_last_login(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), IdentityStoreError>;
}
