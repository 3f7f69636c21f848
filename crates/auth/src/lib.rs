//! `storekeep-auth` — stateless token authentication and authorization.
//!
//! Tokens are signed once by the identity service and verified locally by
//! every other service with the shared secret. Nothing here performs network
//! or storage I/O, and nothing here knows about HTTP.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod config;
pub mod denylist;
pub mod identity;
pub mod issuer;
pub mod keys;
pub mod password;
pub mod permissions;
pub mod refresh;
pub mod roles;
pub mod verifier;

pub use authorize::{AuthzError, require_any_permission, require_permission, require_role};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use codec::{CodecError, TokenCodec};
pub use config::{AuthConfig, ConfigError, TokenSettings};
pub use denylist::{Denylist, InMemoryDenylist};
pub use identity::Identity;
pub use issuer::{IssueError, IssuedToken, TokenIssuer};
pub use keys::{KeyLookup, KeyRing, KeyRingError, SigningKey};
pub use password::{PasswordError, PasswordHasher};
pub use permissions::Permission;
pub use refresh::{RefreshError, RefreshPolicy};
pub use roles::RoleName;
pub use verifier::{TokenVerifier, VerifyError};
