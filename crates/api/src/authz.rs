//! Per-route authorization gates.
//!
//! Each gate is axum middleware meant for `route_layer` behind
//! [`auth_middleware`](crate::middleware::auth_middleware). Gates read only
//! the verified claims already attached to the request; they never touch
//! storage or the network.

use std::future::Future;
use std::pin::Pin;

use axum::{extract::Request, middleware::Next, response::Response};

use storekeep_auth::AuthzError;

use crate::app::errors;
use crate::context::AuthContext;

pub type GateFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Require one exact permission.
///
/// ```ignore
/// Router::new()
///     .route("/orders", get(list_orders))
///     .route_layer(axum::middleware::from_fn(authz::require_permission("orders-read")))
/// ```
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(gate(req, next, move |ctx| {
            storekeep_auth::require_permission(ctx.claims(), permission)
        }))
    }
}

/// Require at least one of `permissions`.
pub fn require_any_permission(
    permissions: &'static [&'static str],
) -> impl Fn(Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(gate(req, next, move |ctx| {
            storekeep_auth::require_any_permission(ctx.claims(), permissions)
        }))
    }
}

/// Require the caller's role to be exactly `role`.
pub fn require_role(
    role: &'static str,
) -> impl Fn(Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(gate(req, next, move |ctx| {
            storekeep_auth::require_role(ctx.claims(), role)
        }))
    }
}

async fn gate<F>(req: Request, next: Next, check: F) -> Response
where
    F: FnOnce(&AuthContext) -> Result<(), AuthzError> + Send,
{
    let Some(ctx) = req.extensions().get::<AuthContext>() else {
        tracing::warn!(path = %req.uri().path(), reason = "missing_token", "gate reached without auth context");
        return errors::missing_token();
    };

    if let Err(err) = check(ctx) {
        tracing::warn!(
            user_id = %ctx.user_id(),
            username = ctx.username(),
            role = ctx.role().as_str(),
            required = ?err.required(),
            path = %req.uri().path(),
            "permission denied"
        );
        return errors::forbidden(&err);
    }

    next.run(req).await
}
