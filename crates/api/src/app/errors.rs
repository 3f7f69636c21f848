use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use storekeep_auth::{AuthzError, RefreshError, VerifyError};

use crate::app::services::LoginError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn missing_token() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "missing_token",
        "authorization header with a bearer token is required",
    )
}

/// Every verification failure shares one code; the message says which.
pub fn invalid_token(err: &VerifyError) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "invalid_token", err.to_string())
}

pub fn forbidden(err: &AuthzError) -> Response {
    let body = match err {
        AuthzError::RoleMismatch { required } => json!({
            "error": "insufficient_role",
            "message": err.to_string(),
            "required": required,
        }),
        AuthzError::MissingPermission(_) | AuthzError::MissingAnyPermission(_) => json!({
            "error": "insufficient_permissions",
            "message": err.to_string(),
            "required": err.required(),
        }),
    };
    (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
}

pub fn internal_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn login_error_to_response(err: LoginError) -> Response {
    match err {
        LoginError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        LoginError::Inactive => json_error(
            StatusCode::UNAUTHORIZED,
            "user_inactive",
            "user account is inactive",
        ),
        LoginError::Store(_) | LoginError::Issue(_) | LoginError::Internal(_) => internal_error(),
    }
}

pub fn refresh_error_to_response(err: &RefreshError) -> Response {
    match err {
        RefreshError::Issue(_) => internal_error(),
        _ => json_error(StatusCode::BAD_REQUEST, "refresh_failed", err.to_string()),
    }
}
