//! HMAC signing keys and key lookup.
//!
//! Every token header carries the `kid` of the key that signed it. Verifiers
//! resolve that `kid` through a [`KeyLookup`], so a secret can be rotated by
//! adding the new key as active and keeping the old one as verification-only
//! until every token it signed has expired.

use std::collections::HashSet;
use std::fmt;

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

/// One shared HMAC-SHA256 secret and its key id.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn new(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            kid: kid.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Source of keys for signing and verification.
pub trait KeyLookup: Send + Sync {
    /// Key used to sign new tokens.
    fn active(&self) -> &SigningKey;

    /// Key for verifying a token with the given `kid` header.
    ///
    /// A token without a `kid` resolves to the active key.
    fn lookup(&self, kid: Option<&str>) -> Option<&SigningKey>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyRingError {
    #[error("duplicate key id '{0}'")]
    DuplicateKid(String),

    #[error("key id must not be empty")]
    EmptyKid,
}

/// One active key plus verification-only keys kept through a rotation.
#[derive(Debug, Clone)]
pub struct KeyRing {
    active: SigningKey,
    previous: Vec<SigningKey>,
}

impl KeyRing {
    pub fn single(active: SigningKey) -> Self {
        Self {
            active,
            previous: Vec::new(),
        }
    }

    pub fn new(active: SigningKey, previous: Vec<SigningKey>) -> Result<Self, KeyRingError> {
        let mut seen = HashSet::new();
        for key in std::iter::once(&active).chain(previous.iter()) {
            if key.kid.is_empty() {
                return Err(KeyRingError::EmptyKid);
            }
            if !seen.insert(key.kid.as_str()) {
                return Err(KeyRingError::DuplicateKid(key.kid.clone()));
            }
        }
        Ok(Self { active, previous })
    }

    pub fn kids(&self) -> Vec<&str> {
        std::iter::once(self.active.kid())
            .chain(self.previous.iter().map(|k| k.kid()))
            .collect()
    }
}

impl KeyLookup for KeyRing {
    fn active(&self) -> &SigningKey {
        &self.active
    }

    fn lookup(&self, kid: Option<&str>) -> Option<&SigningKey> {
        match kid {
            None => Some(&self.active),
            Some(kid) if kid == self.active.kid => Some(&self.active),
            Some(kid) => self.previous.iter().find(|k| k.kid == kid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_active_and_previous_keys() {
        let ring = KeyRing::new(
            SigningKey::new("k2", b"second-secret"),
            vec![SigningKey::new("k1", b"first-secret")],
        )
        .unwrap();

        assert_eq!(ring.lookup(None).unwrap().kid(), "k2");
        assert_eq!(ring.lookup(Some("k2")).unwrap().kid(), "k2");
        assert_eq!(ring.lookup(Some("k1")).unwrap().kid(), "k1");
        assert!(ring.lookup(Some("k0")).is_none());
        assert_eq!(ring.kids(), vec!["k2", "k1"]);
    }

    #[test]
    fn duplicate_kids_are_rejected() {
        let err = KeyRing::new(
            SigningKey::new("k1", b"a"),
            vec![SigningKey::new("k1", b"b")],
        )
        .unwrap_err();
        assert_eq!(err, KeyRingError::DuplicateKid("k1".to_string()));
    }

    #[test]
    fn debug_output_hides_secret() {
        let key = SigningKey::new("k1", b"super-secret-value");
        let rendered = format!("{key:?}");
        assert!(rendered.contains("k1"));
        assert!(!rendered.contains("super-secret-value"));
    }
}
