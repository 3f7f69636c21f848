//! Inventory service shell. Only demonstrates permission gating.

use axum::{
    extract::Extension,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::authz::{require_any_permission, require_permission};
use crate::context::AuthContext;

pub fn router() -> Router {
    let read_routes = Router::new()
        .route("/inventory/items", get(list_items))
        .route_layer(middleware::from_fn(require_permission("inventory-read")));

    let write_routes = Router::new()
        .route("/inventory/items", post(create_item))
        .route_layer(middleware::from_fn(require_permission("inventory-write")));

    let report_routes = Router::new()
        .route("/inventory/valuation", get(valuation))
        .route_layer(middleware::from_fn(require_any_permission(&[
            "inventory-read",
            "reports-read",
        ])));

    read_routes.merge(write_routes).merge(report_routes)
}

pub async fn list_items(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "service": "inventory",
        "requested_by": ctx.username(),
        "items": [],
    }))
}

pub async fn create_item(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    tracing::info!(user_id = %ctx.user_id(), "inventory item create accepted");
    (
        StatusCode::CREATED,
        Json(json!({ "service": "inventory", "accepted": true, "requested_by": ctx.username() })),
    )
}

pub async fn valuation(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "service": "inventory",
        "requested_by": ctx.username(),
        "total_value": 0,
        "lines": [],
    }))
}
