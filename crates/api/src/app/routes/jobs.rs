//! Job postings.
//!
//! Reads are optional-auth (anonymous callers see published jobs only);
//! writes require an hr user of the owning company or an admin.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;

use hireflow_auth::{Principal, Role, permissions::catalog, require_permission, require_role};
use hireflow_core::{CompanyId, JobId};
use hireflow_infra::{JobFilter, JobVisibility};
use hireflow_recruiting::{Job, PostJob};

use crate::app::dto::{self, ApiJson, CreateJobRequest, JobListQuery};
use crate::app::errors::ApiError;
use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{OptionalPrincipal, PrincipalContext};

/// Optional-auth routes.
pub fn public_router() -> Router {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
}

/// Authenticated routes.
pub fn router() -> Router {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:id/publish", post(publish_job))
        .route("/jobs/:id/close", post(close_job))
}

/// POST /jobs
pub async fn create_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateJobRequest>,
) -> Result<Response, ApiError> {
    let principal = principal.principal();
    require_role(principal, &[Role::Hr, Role::Admin])?;
    require_permission(principal, &[catalog::JOBS_CREATE])?;

    let requested: Option<CompanyId> = parse_optional_id(body.company_id.as_deref(), "company_id")?;
    let company_id = resolve_posting_company(principal, requested)?;
    if services.store.find_company(company_id).await?.is_none() {
        return Err(ApiError::NotFound("company"));
    }

    let job = Job::post(PostJob {
        company_id,
        title: body.title,
        description: body.description,
        location: body.location,
        application_deadline: body.application_deadline,
        created_by: principal.id,
        occurred_at: Utc::now(),
    })?;
    services.store.insert_job(&job).await?;

    tracing::info!(job_id = %job.id, company_id = %job.company_id, "job posted");
    Ok(dto::created(job, "job created as draft"))
}

/// hr users post for their own company; admins must name one.
fn resolve_posting_company(principal: &Principal, requested: Option<CompanyId>) -> Result<CompanyId, ApiError> {
    if principal.is_admin() {
        return requested.ok_or_else(|| ApiError::validation("company_id is required"));
    }
    let own = authz::hr_company(principal)?;
    match requested {
        Some(other) if other != own => Err(ApiError::Forbidden(
            "cannot post jobs for another company".to_string(),
        )),
        _ => Ok(own),
    }
}

/// GET /jobs
pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<OptionalPrincipal>,
    Query(query): Query<JobListQuery>,
) -> Result<Response, ApiError> {
    let visibility = match viewer.principal() {
        Some(p) if p.is_admin() => JobVisibility::All,
        Some(p) if p.role == Role::Hr => match p.company_id {
            Some(company_id) => JobVisibility::PublishedOrCompany(company_id),
            None => JobVisibility::Published,
        },
        _ => JobVisibility::Published,
    };
    let filter = JobFilter {
        visibility,
        company_id: parse_optional_id(query.company_id.as_deref(), "company_id")?,
    };

    let jobs = services.store.list_jobs(filter).await?;
    Ok(dto::ok(jobs))
}

/// GET /jobs/:id
pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<OptionalPrincipal>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: JobId = parse_id(&id, "id")?;
    match services.store.find_job(id).await? {
        Some(job) if authz::can_view_job(viewer.principal(), &job) => Ok(dto::ok(job)),
        _ => Err(ApiError::NotFound("job")),
    }
}

/// POST /jobs/:id/publish
pub async fn publish_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = load_managed_job(&services, principal.principal(), &id).await?;
    let published = job.publish(Utc::now())?;
    services.store.update_job(&published).await?;

    tracing::info!(job_id = %published.id, "job published");
    Ok(dto::ok_with_message(published, "job published"))
}

/// POST /jobs/:id/close
pub async fn close_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = load_managed_job(&services, principal.principal(), &id).await?;
    let closed = job.close(Utc::now())?;
    services.store.update_job(&closed).await?;

    tracing::info!(job_id = %closed.id, "job closed");
    Ok(dto::ok_with_message(closed, "job closed"))
}

async fn load_managed_job(services: &AppServices, principal: &Principal, raw_id: &str) -> Result<Job, ApiError> {
    let id: JobId = parse_id(raw_id, "id")?;
    let job = services
        .store
        .find_job(id)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    authz::can_manage_job(principal, &job, &catalog::JOBS_PUBLISH)?;
    Ok(job)
}
