//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: identity store, password hashing, token issue/verify/refresh
//! - `routes/`: HTTP routes + handlers (one file per service)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storekeep_infra::IdentityStore;

use crate::config::{AppConfig, ServiceKind};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, BuildError};

/// Build the HTTP router for the services selected in `config`.
///
/// Every hosted service verifies tokens locally; only the identity service
/// routes touch `store`.
pub fn build_app(config: &AppConfig, store: Arc<dyn IdentityStore>) -> Result<Router, BuildError> {
    let services = Arc::new(AppServices::build(&config.auth, store)?);
    let auth_state = middleware::AuthState {
        verifier: services.verifier(),
    };

    let mut public = Router::new().route("/health", get(routes::system::health));
    let mut protected = Router::new();

    for kind in &config.services {
        match kind {
            ServiceKind::Identity => {
                public = public.merge(routes::auth::public_router());
                protected = protected.merge(routes::auth::protected_router());
            }
            ServiceKind::Inventory => protected = protected.merge(routes::inventory::router()),
            ServiceKind::Orders => protected = protected.merge(routes::orders::router()),
            ServiceKind::Expenses => protected = protected.merge(routes::expenses::router()),
        }
        tracing::info!(service = kind.as_str(), "service routes mounted");
    }

    // Protected routes: require a verified bearer token.
    let protected = protected.layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Ok(Router::new()
        .merge(public)
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services))))
}
