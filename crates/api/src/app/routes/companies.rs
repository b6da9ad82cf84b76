use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;

use hireflow_auth::{Role, require_role};
use hireflow_core::CompanyId;
use hireflow_recruiting::{Company, RegisterCompany};

use crate::app::dto::{self, ApiJson, CreateCompanyRequest};
use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/companies", post(create_company))
        .route("/companies/:id", get(get_company))
}

/// POST /companies (admin)
pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateCompanyRequest>,
) -> Result<Response, ApiError> {
    require_role(principal.principal(), &[Role::Admin])?;

    let company = Company::register(RegisterCompany {
        name: body.name,
        website: body.website,
        occurred_at: Utc::now(),
    })?;
    services.store.insert_company(&company).await?;

    tracing::info!(company_id = %company.id, "company registered");
    Ok(dto::created(company, "company registered"))
}

/// GET /companies/:id
pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CompanyId = parse_id(&id, "id")?;
    let company = services
        .store
        .find_company(id)
        .await?
        .ok_or(ApiError::NotFound("company"))?;
    Ok(dto::ok(company))
}
