//! Admin routes for account management.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::post,
};

use hireflow_auth::{Permission, PermissionSet, Role, require_role};
use hireflow_core::{CompanyId, UserId};
use hireflow_recruiting::RegisterAccount;

use crate::app::dto::{self, ApiJson, CreateUserRequest};
use crate::app::errors::ApiError;
use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin/users", post(create_user))
        .route("/admin/users/:id/deactivate", post(deactivate_user))
        .route("/admin/users/:id/activate", post(activate_user))
}

/// POST /admin/users - create an hr, admin or candidate account
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<Response, ApiError> {
    require_role(principal.principal(), &[Role::Admin])?;

    let role: Role = body
        .role
        .parse()
        .map_err(|e: hireflow_auth::UnknownRole| ApiError::validation(e.to_string()))?;
    let company_id: Option<CompanyId> = parse_optional_id(body.company_id.as_deref(), "company_id")?;
    let permissions: PermissionSet = body
        .permissions
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(Permission::new)
        .collect();

    let account = services
        .register_account(RegisterAccount {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            role,
            permissions,
            company_id,
            email_verified: body.email_verified,
        })
        .await?;

    tracing::info!(
        actor = %principal.principal().id,
        user_id = %account.id,
        role = %account.role,
        "account created by admin"
    );
    Ok(dto::created(account, "user created"))
}

/// POST /admin/users/:id/deactivate
///
/// Outstanding tokens of the user stop working on their next request.
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    set_active(&services, &principal, &id, false).await
}

/// POST /admin/users/:id/activate
pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    set_active(&services, &principal, &id, true).await
}

async fn set_active(
    services: &AppServices,
    principal: &PrincipalContext,
    raw_id: &str,
    active: bool,
) -> Result<Response, ApiError> {
    let actor = principal.principal();
    require_role(actor, &[Role::Admin])?;

    let id: UserId = parse_id(raw_id, "id")?;
    if id == actor.id && !active {
        return Err(ApiError::validation("admins cannot deactivate their own account"));
    }
    if !services.store.set_user_active(id, active).await? {
        return Err(ApiError::NotFound("user"));
    }
    let user = services
        .store
        .find_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    tracing::info!(actor = %actor.id, user_id = %id, active, "account activation changed");
    let message = if active { "user activated" } else { "user deactivated" };
    Ok(dto::ok_with_message(user, message))
}
