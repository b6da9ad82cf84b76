//! Registration, login and the current principal.

use std::sync::Arc;

use axum::{extract::Extension, response::Response};
use chrono::Utc;

use hireflow_auth::{PermissionSet, Role};
use hireflow_recruiting::RegisterAccount;

use crate::app::dto::{self, ApiJson, LoginRequest, LoginResponse, RegisterRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// POST /auth/register - candidate self-registration
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let account = services
        .register_account(RegisterAccount {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            role: Role::Candidate,
            permissions: PermissionSet::new(),
            company_id: None,
            email_verified: false,
        })
        .await?;

    Ok(dto::created(account, "account registered"))
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let principal = services
        .sessions
        .verify_credentials(&body.email, &body.password)
        .await?;
    let token = services.sessions.issue_token(principal.id)?;

    // Bookkeeping only; a failure here must not fail the login.
    if let Err(e) = services.store.record_login(principal.id, Utc::now()).await {
        tracing::warn!(user_id = %principal.id, error = %e, "failed to record last login");
    }

    tracing::info!(user_id = %principal.id, role = %principal.role, "login succeeded");
    Ok(dto::ok(LoginResponse::new(token, principal)))
}

/// GET /auth/me
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> Response {
    dto::ok(principal.principal())
}
