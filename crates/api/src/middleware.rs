use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use storekeep_auth::TokenVerifier;

use crate::app::errors;
use crate::context::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

/// Authenticate the request from its bearer token.
///
/// On success the verified `Claims` and an [`AuthContext`] are attached to
/// the request extensions. No network call is made.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        tracing::warn!(path = %req.uri().path(), reason = "missing_token", "request rejected");
        return errors::missing_token();
    };

    let claims = match state.verifier.verify(token, Utc::now()) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                reason = err.kind(),
                "request rejected: token verification failed"
            );
            return errors::invalid_token(&err);
        }
    };

    req.extensions_mut().insert(AuthContext::new(claims.clone()));
    req.extensions_mut().insert(claims);

    next.run(req).await
}

/// Exactly `Bearer <token>`: case-sensitive scheme, one space, non-empty token.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;

    if token.is_empty() || token.starts_with(' ') {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        h
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn scheme_is_case_sensitive_and_exact() {
        assert_eq!(extract_bearer(&headers("bearer abc")), None);
        assert_eq!(extract_bearer(&headers("BEARER abc")), None);
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer  abc")), None);
        assert_eq!(extract_bearer(&headers("Bearerabc")), None);
        assert_eq!(extract_bearer(&headers("abc")), None);
    }

    #[test]
    fn empty_token_yields_none() {
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
    }
}
