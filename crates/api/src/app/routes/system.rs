use std::sync::Arc;

use axum::{extract::Extension, response::Response};

use crate::app::dto::{self, HealthResponse};
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Response {
    dto::ok(HealthResponse {
        status: "ok",
        store: services.store_kind(),
    })
}
