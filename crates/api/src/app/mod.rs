//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection, session service, lifecycle manager
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and the JSON envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub use services::{AppServices, ServicesError};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        sessions: services.sessions.clone(),
    };
    let environment = services.config.environment;

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::auth_middleware,
    ));
    let optional = routes::optional_auth_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::optional_auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(optional)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_span))
                .layer(axum::middleware::from_fn_with_state(
                    environment,
                    middleware::internal_error_detail,
                ))
                .layer(Extension(services)),
        )
}
