use axum::{Router, routing::get};

pub mod admin;
pub mod applications;
pub mod auth;
pub mod common;
pub mod companies;
pub mod jobs;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", axum::routing::post(auth::register))
        .route("/auth/login", axum::routing::post(auth::login))
}

/// Routes where a token is optional (anonymous callers get a narrower view).
pub fn optional_auth_router() -> Router {
    jobs::public_router()
}

/// Routes requiring an authenticated principal.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .merge(applications::router())
        .merge(companies::router())
        .merge(jobs::router())
        .merge(admin::router())
}
