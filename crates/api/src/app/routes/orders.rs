//! Orders service shell.

use axum::{
    extract::Extension,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::authz::require_permission;
use crate::context::AuthContext;

pub fn router() -> Router {
    let read_routes = Router::new()
        .route("/orders", get(list_orders))
        .route_layer(middleware::from_fn(require_permission("orders-read")));

    let write_routes = Router::new()
        .route("/orders", post(create_order))
        .route_layer(middleware::from_fn(require_permission("orders-write")));

    read_routes.merge(write_routes)
}

pub async fn list_orders(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({ "service": "orders", "requested_by": ctx.username(), "orders": [] }))
}

pub async fn create_order(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    tracing::info!(user_id = %ctx.user_id(), "order create accepted");
    (
        StatusCode::CREATED,
        Json(json!({ "service": "orders", "accepted": true, "requested_by": ctx.username() })),
    )
}
