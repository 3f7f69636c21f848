//! Optional short-lived token denylist.
//!
//! Verification stays stateless unless a denylist is plugged into the
//! verifier. Entries only need to live until the denied token would have
//! expired anyway, so the list stays small.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

/// Store of revoked token ids (`jti`).
pub trait Denylist: Send + Sync {
    /// Reject `jti` until `until` (the token's own expiry).
    fn deny(&self, jti: &str, until: DateTime<Utc>, now: DateTime<Utc>);

    fn is_denied(&self, jti: &str, now: DateTime<Utc>) -> bool;
}

/// Process-local denylist for a single service instance.
#[derive(Debug, Default)]
pub struct InMemoryDenylist {
    inner: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Denylist for InMemoryDenylist {
    fn deny(&self, jti: &str, until: DateTime<Utc>, now: DateTime<Utc>) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_, expires| *expires > now);
            if until > now {
                map.insert(jti.to_string(), until);
            }
        }
    }

    fn is_denied(&self, jti: &str, now: DateTime<Utc>) -> bool {
        match self.inner.read() {
            Ok(map) => map.get(jti).is_some_and(|until| *until > now),
            Err(_) => false,
        }
    }
}
