//! Process-wide auth configuration.
//!
//! Read once at start-up; nothing here is reloaded at runtime. Changing any
//! value means restarting every service that shares it.

use chrono::Duration;
use thiserror::Error;

use crate::keys::{KeyRing, KeyRingError, SigningKey};

pub const DEFAULT_ISSUER: &str = "storekeep-identity";
pub const DEFAULT_AUDIENCE: &str = "storekeep-services";
pub const DEFAULT_KEY_ID: &str = "primary";
pub const DEFAULT_EXPIRATION_SECONDS: i64 = 600;
pub const DEFAULT_REFRESH_THRESHOLD_SECONDS: i64 = 120;
pub const DEFAULT_MAX_SESSION_SECONDS: i64 = 12 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;
/// Upper bound for every token and session duration setting.
pub const MAX_DURATION_SECONDS: i64 = 366 * 24 * 60 * 60;

const RECOMMENDED_SECRET_LEN: usize = 32;
const RECOMMENDED_BCRYPT_COST: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    Missing(&'static str),

    #[error("invalid env var {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid key ring: {0}")]
    Keys(#[from] KeyRingError),
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Lifetimes and the fixed `iss`/`aud` values stamped into every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub issuer: String,
    pub audience: String,
    pub expiration: Duration,
    pub refresh_threshold: Duration,
    /// Absolute ceiling on a refresh chain, measured from login.
    /// `None` allows refreshing indefinitely.
    pub max_session: Option<Duration>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiration: Duration::seconds(DEFAULT_EXPIRATION_SECONDS),
            refresh_threshold: Duration::seconds(DEFAULT_REFRESH_THRESHOLD_SECONDS),
            max_session: Some(Duration::seconds(DEFAULT_MAX_SESSION_SECONDS)),
        }
    }
}

impl TokenSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ceiling = Duration::seconds(MAX_DURATION_SECONDS);
        let too_long = format!("must not exceed {MAX_DURATION_SECONDS} seconds");
        if self.expiration > ceiling {
            return Err(invalid("JWT_EXPIRATION_SECONDS", too_long));
        }
        if self.refresh_threshold > ceiling {
            return Err(invalid("JWT_REFRESH_THRESHOLD_SECONDS", too_long));
        }
        if self.max_session.is_some_and(|max| max > ceiling) {
            return Err(invalid("JWT_MAX_SESSION_SECONDS", too_long));
        }
        if self.expiration <= Duration::zero() {
            return Err(invalid("JWT_EXPIRATION_SECONDS", "must be positive"));
        }
        if self.refresh_threshold <= Duration::zero() {
            return Err(invalid("JWT_REFRESH_THRESHOLD_SECONDS", "must be positive"));
        }
        if self.refresh_threshold >= self.expiration {
            return Err(invalid(
                "JWT_REFRESH_THRESHOLD_SECONDS",
                "must be shorter than the token expiration",
            ));
        }
        if let Some(max) = self.max_session {
            if max < self.expiration {
                return Err(invalid(
                    "JWT_MAX_SESSION_SECONDS",
                    "must not be shorter than the token expiration",
                ));
            }
        }
        if self.issuer.is_empty() {
            return Err(invalid("JWT_ISSUER", "must not be empty"));
        }
        if self.audience.is_empty() {
            return Err(invalid("JWT_AUDIENCE", "must not be empty"));
        }
        Ok(())
    }
}

/// Everything the auth subsystem reads from the environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub keys: KeyRing,
    pub tokens: TokenSettings,
    pub bcrypt_cost: u32,
    pub denylist_enabled: bool,
}

impl AuthConfig {
    /// Defaults around a single shared secret (dev and tests).
    pub fn for_secret(secret: &str) -> Self {
        Self {
            keys: KeyRing::single(SigningKey::new(DEFAULT_KEY_ID, secret.as_bytes())),
            tokens: TokenSettings::default(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            denylist_enabled: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secret.len(),
                "JWT_SECRET is shorter than {RECOMMENDED_SECRET_LEN} bytes"
            );
        }
        let kid = lookup("JWT_KEY_ID").unwrap_or_else(|| DEFAULT_KEY_ID.to_string());
        let previous = match lookup("JWT_PREVIOUS_KEYS") {
            Some(raw) => parse_previous_keys(&raw)?,
            None => Vec::new(),
        };
        let keys = KeyRing::new(SigningKey::new(kid, secret.as_bytes()), previous)?;

        let max_session_secs = parse_i64(
            &lookup,
            "JWT_MAX_SESSION_SECONDS",
            DEFAULT_MAX_SESSION_SECONDS,
        )?;
        let max_session = if max_session_secs > 0 {
            Some(seconds("JWT_MAX_SESSION_SECONDS", max_session_secs)?)
        } else {
            None
        };
        let tokens = TokenSettings {
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            expiration: seconds(
                "JWT_EXPIRATION_SECONDS",
                parse_i64(&lookup, "JWT_EXPIRATION_SECONDS", DEFAULT_EXPIRATION_SECONDS)?,
            )?,
            refresh_threshold: seconds(
                "JWT_REFRESH_THRESHOLD_SECONDS",
                parse_i64(
                    &lookup,
                    "JWT_REFRESH_THRESHOLD_SECONDS",
                    DEFAULT_REFRESH_THRESHOLD_SECONDS,
                )?,
            )?,
            max_session,
        };
        tokens.validate()?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| invalid("BCRYPT_COST", "not an integer"))?,
            None => DEFAULT_BCRYPT_COST,
        };
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(invalid(
                "BCRYPT_COST",
                format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
            ));
        }
        if bcrypt_cost < RECOMMENDED_BCRYPT_COST {
            tracing::warn!(bcrypt_cost, "BCRYPT_COST below recommended minimum of 10");
        }

        let denylist_enabled = match lookup("AUTH_DENYLIST").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(_) => return Err(invalid("AUTH_DENYLIST", "expected true or false")),
        };

        Ok(Self {
            keys,
            tokens,
            bcrypt_cost,
            denylist_enabled,
        })
    }
}

fn parse_i64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: i64,
) -> Result<i64, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(key, "not an integer")),
        None => Ok(default),
    }
}

fn seconds(key: &'static str, secs: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(secs).ok_or_else(|| invalid(key, "out of range"))
}

/// `kid=secret,kid=secret`
fn parse_previous_keys(raw: &str) -> Result<Vec<SigningKey>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kid, secret) = entry
                .split_once('=')
                .ok_or_else(|| invalid("JWT_PREVIOUS_KEYS", "expected kid=secret"))?;
            if secret.is_empty() {
                return Err(invalid("JWT_PREVIOUS_KEYS", "empty secret"));
            }
            Ok(SigningKey::new(kid.trim(), secret.as_bytes()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyLookup;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = AuthConfig::from_lookup(vars(&[(
            "JWT_SECRET",
            "0123456789abcdef0123456789abcdef",
        )]))
        .unwrap();

        assert_eq!(cfg.tokens, TokenSettings::default());
        assert_eq!(cfg.bcrypt_cost, 10);
        assert!(!cfg.denylist_enabled);
        assert_eq!(cfg.keys.active().kid(), "primary");
    }

    #[test]
    fn secret_is_required() {
        let err = AuthConfig::from_lookup(vars(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn threshold_must_be_shorter_than_expiration() {
        let err = AuthConfig::from_lookup(vars(&[
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION_SECONDS", "60"),
            ("JWT_REFRESH_THRESHOLD_SECONDS", "60"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "JWT_REFRESH_THRESHOLD_SECONDS",
                ..
            }
        ));
    }

    #[test]
    fn zero_max_session_disables_the_ceiling() {
        let cfg = AuthConfig::from_lookup(vars(&[
            ("JWT_SECRET", "s"),
            ("JWT_MAX_SESSION_SECONDS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.tokens.max_session, None);
    }

    #[test]
    fn previous_keys_are_loaded_for_verification() {
        let cfg = AuthConfig::from_lookup(vars(&[
            ("JWT_SECRET", "new-secret"),
            ("JWT_KEY_ID", "2026-03"),
            ("JWT_PREVIOUS_KEYS", "2026-01=old-one, 2026-02=old-two"),
        ]))
        .unwrap();
        assert_eq!(cfg.keys.kids(), vec!["2026-03", "2026-01", "2026-02"]);
    }

    #[test]
    fn bcrypt_cost_is_range_checked() {
        let err = AuthConfig::from_lookup(vars(&[("JWT_SECRET", "s"), ("BCRYPT_COST", "3")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BCRYPT_COST", .. }));
    }

    #[test]
    fn out_of_range_seconds_are_rejected() {
        let err = AuthConfig::from_lookup(vars(&[
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION_SECONDS", "9223372036854775807"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "JWT_EXPIRATION_SECONDS",
                ..
            }
        ));
    }

    #[test]
    fn durations_beyond_the_ceiling_are_rejected() {
        for (key, value) in [
            ("JWT_EXPIRATION_SECONDS", "10000000000000"),
            ("JWT_MAX_SESSION_SECONDS", "10000000000000"),
        ] {
            let err = AuthConfig::from_lookup(vars(&[("JWT_SECRET", "s"), (key, value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "expected {key} to be rejected, got {err:?}"
            );
        }

        let settings = TokenSettings {
            refresh_threshold: Duration::seconds(MAX_DURATION_SECONDS + 1),
            ..TokenSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid {
                key: "JWT_REFRESH_THRESHOLD_SECONDS",
                ..
            })
        ));
    }

    #[test]
    fn denylist_flag_parses() {
        let cfg = AuthConfig::from_lookup(vars(&[("JWT_SECRET", "s"), ("AUTH_DENYLIST", "true")]))
            .unwrap();
        assert!(cfg.denylist_enabled);
    }
}
