//! Signed token wire format.
//!
//! `base64url(header) . base64url(claims) . base64url(HMAC-SHA256)`, where
//! the header is `{"alg":"HS256","typ":"JWT","kid":..}`. HS256 is the only
//! accepted algorithm; a header naming anything else (including `none`) is
//! rejected before any key is touched.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::Claims;
use crate::keys::{KeyLookup, KeyRing};

pub const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_NAME: &str = "HS256";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported token algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("unknown signing key '{0}'")]
    UnknownKey(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Encodes and decodes claim sets with the shared HMAC keys.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<dyn KeyLookup>,
}

impl TokenCodec {
    pub fn new(keys: Arc<dyn KeyLookup>) -> Self {
        Self { keys }
    }

    pub fn with_key_ring(ring: KeyRing) -> Self {
        Self::new(Arc::new(ring))
    }

    /// Sign `claims` with the active key.
    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        let key = self.keys.active();
        let mut header = Header::new(ALGORITHM);
        header.kid = Some(key.kid().to_string());

        jsonwebtoken::encode(&header, claims, key.encoding_key())
            .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    /// Check structure, algorithm and signature, then parse the claims.
    ///
    /// Time is not considered here.
    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        let mut segments = token.splitn(3, '.');
        let (Some(header_b64), Some(payload_b64), Some(signature)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(CodecError::Malformed("expected three segments".into()));
        };
        if header_b64.is_empty() || payload_b64.is_empty() {
            return Err(CodecError::Malformed("expected three segments".into()));
        }
        // A stray dot is left in the signature and fails the comparison below.
        let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];

        let header: RawHeader = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM_NAME {
            return Err(CodecError::UnsupportedAlgorithm(header.alg));
        }

        let key = self.keys.lookup(header.kid.as_deref()).ok_or_else(|| {
            CodecError::UnknownKey(header.kid.clone().unwrap_or_default())
        })?;

        // Compares the encoded signature, so any altered character fails here
        // rather than in base64 decoding.
        let valid = jsonwebtoken::crypto::verify(
            signature,
            signing_input.as_bytes(),
            key.decoding_key(),
            ALGORITHM,
        )
        .map_err(|_| CodecError::InvalidSignature)?;
        if !valid {
            return Err(CodecError::InvalidSignature);
        }

        decode_segment(payload_b64, "payload")
    }

    pub fn active_kid(&self) -> &str {
        self.keys.active().kid()
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("active_kid", &self.active_kid())
            .finish()
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CodecError::Malformed(format!("{what} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CodecError::Malformed(format!("{what} is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::test_support::{sample_claims, test_time};
    use crate::keys::SigningKey;
    use proptest::prelude::*;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::with_key_ring(KeyRing::single(SigningKey::new("primary", SECRET)))
    }

    fn forge(header: &str, claims: &Claims) -> String {
        let h = URL_SAFE_NO_PAD.encode(header);
        let p = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{h}.{p}.")
    }

    #[test]
    fn encoded_token_has_three_segments_and_kid() {
        let token = codec().encode(&sample_claims(test_time())).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.kid.as_deref(), Some("primary"));
    }

    #[test]
    fn payload_is_readable_without_the_secret() {
        let claims = sample_claims(test_time());
        let token = codec().encode(&claims).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(json["username"], "clerk");
        assert_eq!(json["role"], "employee");
    }

    #[test]
    fn wrong_secret_is_an_invalid_signature() {
        let token = codec().encode(&sample_claims(test_time())).unwrap();
        let other = TokenCodec::with_key_ring(KeyRing::single(SigningKey::new(
            "primary",
            b"another-secret-key-for-jwt-testing-32-chars",
        )));
        assert_eq!(other.decode(&token), Err(CodecError::InvalidSignature));
    }

    #[test]
    fn none_algorithm_is_rejected() {
        let token = forge(r#"{"alg":"none","typ":"JWT"}"#, &sample_claims(test_time()));
        assert_eq!(
            codec().decode(&token),
            Err(CodecError::UnsupportedAlgorithm("none".into()))
        );
    }

    #[test]
    fn other_hmac_algorithms_are_rejected() {
        let token = forge(
            r#"{"alg":"HS512","typ":"JWT","kid":"primary"}"#,
            &sample_claims(test_time()),
        );
        assert_eq!(
            codec().decode(&token),
            Err(CodecError::UnsupportedAlgorithm("HS512".into()))
        );
    }

    #[test]
    fn unknown_kid_is_rejected() {
        let token = forge(
            r#"{"alg":"HS256","typ":"JWT","kid":"retired"}"#,
            &sample_claims(test_time()),
        );
        assert_eq!(
            codec().decode(&token),
            Err(CodecError::UnknownKey("retired".into()))
        );
    }

    #[test]
    fn structural_garbage_is_malformed() {
        for token in ["garbage", "a.b", "", "..", "a..c", "a.b.c.d", "!!!.e30.sig"] {
            assert!(
                matches!(codec().decode(token), Err(CodecError::Malformed(_))),
                "expected malformed for {token:?}"
            );
        }
    }

    #[test]
    fn dot_inside_signature_is_an_invalid_signature() {
        let codec = codec();
        let token = codec.encode(&sample_claims(test_time())).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        let mut tampered = token.clone();
        tampered.replace_range(sig_start + 4..sig_start + 5, ".");
        assert_eq!(codec.decode(&tampered), Err(CodecError::InvalidSignature));

        let appended = format!("{token}.extra");
        assert_eq!(codec.decode(&appended), Err(CodecError::InvalidSignature));
    }

    #[test]
    fn previous_key_still_verifies_after_rotation() {
        let claims = sample_claims(test_time());
        let old = TokenCodec::with_key_ring(KeyRing::single(SigningKey::new("k1", SECRET)));
        let token = old.encode(&claims).unwrap();

        let rotated = TokenCodec::with_key_ring(
            KeyRing::new(
                SigningKey::new("k2", b"rotated-secret-key-for-jwt-testing-32ch"),
                vec![SigningKey::new("k1", SECRET)],
            )
            .unwrap(),
        );
        assert_eq!(rotated.decode(&token), Ok(claims.clone()));
        assert_eq!(rotated.active_kid(), "k2");

        let fresh = rotated.encode(&claims).unwrap();
        assert_eq!(
            old.decode(&fresh),
            Err(CodecError::UnknownKey("k2".into()))
        );
    }

    fn arb_permissions() -> impl Strategy<Value = Vec<crate::Permission>> {
        prop::collection::vec("[a-z]{1,12}-(read|write)", 0..6).prop_map(|names| {
            crate::identity::dedup_permissions(names.into_iter().map(crate::Permission::new))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: decode(encode(claims)) == claims, including unicode
        /// display names and empty permission lists.
        #[test]
        fn round_trip_preserves_claims(
            name in "\\PC{0,24}",
            username in "[a-z][a-z0-9_]{0,15}",
            permissions in arb_permissions(),
        ) {
            let mut claims = sample_claims(test_time());
            claims.name = name;
            claims.username = username;
            claims.permissions = permissions;

            let codec = codec();
            let token = codec.encode(&claims).unwrap();
            prop_assert_eq!(codec.decode(&token).unwrap(), claims);
        }

        /// Property: changing any single character of the signature segment
        /// yields InvalidSignature and nothing else.
        #[test]
        fn tampered_signature_is_always_invalid(index in 0usize..43, replacement in 0usize..65) {
            const ALPHABET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.";

            let codec = codec();
            let token = codec.encode(&sample_claims(test_time())).unwrap();
            let sig_start = token.rfind('.').unwrap() + 1;
            let mut bytes = token.into_bytes();
            let pos = sig_start + index % (bytes.len() - sig_start);

            let mut new_char = ALPHABET[replacement];
            if new_char == bytes[pos] {
                new_char = ALPHABET[(replacement + 1) % ALPHABET.len()];
            }
            bytes[pos] = new_char;
            let tampered = String::from_utf8(bytes).unwrap();

            prop_assert_eq!(codec.decode(&tampered), Err(CodecError::InvalidSignature));
        }
    }

    #[test]
    fn unicode_display_name_and_empty_permissions_round_trip() {
        let mut claims = sample_claims(test_time());
        claims.name = "Zoë Ñúñez 店長 🧾".to_string();
        claims.permissions.clear();

        let codec = codec();
        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.decode(&token), Ok(claims));
    }
}
