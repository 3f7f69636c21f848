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
        .route("/expenses", get(list_expenses))
        .route_layer(middleware::from_fn(require_permission("expenses-read")));

    let write_routes = Router::new()
        .route("/expenses", post(record_expense))
        .route_layer(middleware::from_fn(require_permission("expenses-write")));

    let report_routes = Router::new()
        .route("/expenses/summary", get(summary))
        .route_layer(middleware::from_fn(require_any_permission(&[
            "expenses-read",
            "reports-read",
        ])));

    read_routes.merge(write_routes).merge(report_routes)
}

pub async fn list_expenses(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({ "service": "expenses", "requested_by": ctx.username(), "expenses": [] }))
}

pub async fn record_expense(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    tracing::info!(user_id = %ctx.user_id(), "expense record accepted");
    (
        StatusCode::CREATED,
        Json(json!({ "service": "expenses", "accepted": true, "requested_by": ctx.username() })),
    )
}

pub async fn summary(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "service": "expenses",
        "requested_by": ctx.username(),
        "total": 0,
        "by_category": [],
    }))
}
