//! Identity service routes (`/auth/*`).

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use storekeep_auth::roles;

use crate::app::services::{AppServices, LoginError};
use crate::app::{dto, errors};
use crate::authz::require_role;
use crate::context::AuthContext;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes that sit behind the auth middleware.
pub fn protected_router() -> Router {
    let caller_routes = Router::new()
        .route("/auth/validate", get(validate))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout));

    let admin_routes = Router::new()
        .route("/auth/roles", get(list_roles))
        .route_layer(middleware::from_fn(require_role("super-admin")));

    caller_routes.merge(admin_routes)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "body must be JSON with username and password",
        );
    };

    if body.username.trim().is_empty() || body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "username and password are required",
        );
    }

    match services.login(&body.username, &body.password, Utc::now()).await {
        Ok(outcome) => (StatusCode::OK, Json(dto::LoginResponse::from(outcome))).into_response(),
        Err(err) => {
            if matches!(
                err,
                LoginError::Store(_) | LoginError::Issue(_) | LoginError::Internal(_)
            ) {
                tracing::error!(error = %err, username = body.username.as_str(), "login failed");
            }
            errors::login_error_to_response(err)
        }
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RefreshRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "body must be JSON with a token",
        );
    };

    match services.refresh(&body.token, Utc::now()) {
        Ok(issued) => (StatusCode::OK, Json(dto::RefreshResponse::from(issued))).into_response(),
        Err(err) => {
            if matches!(err, storekeep_auth::RefreshError::Issue(_)) {
                tracing::error!(error = %err, "token refresh failed");
            } else {
                tracing::warn!(reason = %err, "token refresh rejected");
            }
            errors::refresh_error_to_response(&err)
        }
    }
}

pub async fn validate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> impl IntoResponse {
    let threshold = services.token_settings().refresh_threshold;
    Json(dto::ValidateResponse {
        valid: true,
        user_id: ctx.user_id().to_string(),
        username: ctx.username().to_string(),
        role: ctx.role().as_str().to_string(),
        permissions: dto::permission_names(&ctx),
        expires_at: ctx.expires_at(),
        refresh_at: ctx.claims().refresh_at(threshold),
    })
}

pub async fn me(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(dto::MeResponse::from(&ctx))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> impl IntoResponse {
    let revoked = services.logout(ctx.claims(), Utc::now());
    let message = if revoked {
        "logged out; token revoked"
    } else {
        "logged out; discard the token on the client"
    };
    Json(json!({ "message": message, "revoked": revoked }))
}

pub async fn list_roles() -> impl IntoResponse {
    let roles: Vec<_> = roles::default_roles()
        .into_iter()
        .map(|role| {
            let permissions: Vec<String> = roles::default_role_permissions(role.as_str())
                .iter()
                .map(|p| p.as_str().to_string())
                .collect();
            json!({ "name": role.as_str(), "permissions": permissions })
        })
        .collect();

    Json(json!({ "roles": roles }))
}
