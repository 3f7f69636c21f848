//! Local, stateless token verification.
//!
//! Every service embeds the same [`TokenVerifier`]. It needs only the shared
//! keys and the current time; it never calls the issuing service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::codec::{CodecError, TokenCodec};
use crate::config::TokenSettings;
use crate::denylist::Denylist;
use crate::{Claims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("no token supplied")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,
}

impl VerifyError {
    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed(_) => "malformed",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl From<CodecError> for VerifyError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed(msg) => Self::Malformed(msg),
            CodecError::UnsupportedAlgorithm(_) => Self::UnsupportedAlgorithm,
            // No key we trust could have produced the signature.
            CodecError::UnknownKey(_) | CodecError::InvalidSignature => Self::InvalidSignature,
            CodecError::Encoding(msg) => Self::Malformed(msg),
        }
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    codec: TokenCodec,
    issuer: String,
    audience: String,
    denylist: Option<Arc<dyn Denylist>>,
}

impl TokenVerifier {
    pub fn new(codec: TokenCodec, settings: &TokenSettings) -> Self {
        Self {
            codec,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            denylist: None,
        }
    }

    /// Also reject tokens whose `jti` is on `denylist`.
    pub fn with_denylist(mut self, denylist: Arc<dyn Denylist>) -> Self {
        self.denylist = Some(denylist);
        self
    }

    pub fn denylist(&self) -> Option<&Arc<dyn Denylist>> {
        self.denylist.as_ref()
    }

    /// Decode and validate `token` as of `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::Missing);
        }

        let claims = self.codec.decode(token)?;

        if claims.iss != self.issuer {
            return Err(VerifyError::Malformed("unexpected issuer".into()));
        }
        if claims.aud != self.audience {
            return Err(VerifyError::Malformed("unexpected audience".into()));
        }

        validate_claims(&claims, now).map_err(|e| match e {
            TokenValidationError::Expired => VerifyError::Expired,
            TokenValidationError::InvalidTimeWindow => VerifyError::Malformed(e.to_string()),
        })?;

        if let Some(denylist) = &self.denylist {
            if denylist.is_denied(&claims.jti, now) {
                return Err(VerifyError::Revoked);
            }
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("codec", &self.codec)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("denylist", &self.denylist.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::test_support::{sample_claims, test_time};
    use crate::denylist::InMemoryDenylist;
    use crate::keys::{KeyRing, SigningKey};
    use chrono::Duration;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-testing-minimum-32-chars";

    fn setup() -> (TokenCodec, TokenVerifier) {
        let codec = TokenCodec::with_key_ring(KeyRing::single(SigningKey::new("primary", SECRET)));
        let verifier = TokenVerifier::new(codec.clone(), &TokenSettings::default());
        (codec, verifier)
    }

    #[test]
    fn valid_token_yields_claims() {
        let (codec, verifier) = setup();
        let claims = sample_claims(test_time());
        let token = codec.encode(&claims).unwrap();
        assert_eq!(verifier.verify(&token, test_time()), Ok(claims));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let (codec, verifier) = setup();
        let claims = sample_claims(test_time());
        let token = codec.encode(&claims).unwrap();
        let exp = claims.expires_at();

        assert!(verifier.verify(&token, exp - Duration::seconds(1)).is_ok());
        assert_eq!(verifier.verify(&token, exp), Err(VerifyError::Expired));
        assert_eq!(
            verifier.verify(&token, exp + Duration::seconds(1)),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn empty_token_is_missing() {
        let (_, verifier) = setup();
        assert_eq!(verifier.verify("", test_time()), Err(VerifyError::Missing));
    }

    #[test]
    fn garbage_is_malformed() {
        let (_, verifier) = setup();
        assert!(matches!(
            verifier.verify("garbage", test_time()),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let (codec, verifier) = setup();
        let mut claims = sample_claims(test_time());
        claims.aud = "someone-else".into();
        let token = codec.encode(&claims).unwrap();
        assert!(matches!(
            verifier.verify(&token, test_time()),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_key_reads_as_bad_signature() {
        let (_, verifier) = setup();
        let other = TokenCodec::with_key_ring(KeyRing::single(SigningKey::new("elsewhere", SECRET)));
        let token = other.encode(&sample_claims(test_time())).unwrap();
        assert_eq!(
            verifier.verify(&token, test_time()),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn denied_jti_is_revoked_only_with_a_denylist() {
        let (codec, verifier) = setup();
        let claims = sample_claims(test_time());
        let token = codec.encode(&claims).unwrap();

        let denylist = Arc::new(InMemoryDenylist::new());
        denylist.deny(&claims.jti, claims.expires_at(), test_time());

        assert!(verifier.verify(&token, test_time()).is_ok());
        let strict = verifier.clone().with_denylist(denylist);
        assert_eq!(
            strict.verify(&token, test_time()),
            Err(VerifyError::Revoked)
        );
    }
}
