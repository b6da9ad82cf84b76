//! Job applications and their status history.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    response::Response,
    routing::{get, patch, post},
};

use hireflow_auth::{Principal, Role, require_role};
use hireflow_core::{ApplicationId, JobId, UserId};
use hireflow_infra::ApplicationFilter;
use hireflow_recruiting::{Application, ApplicationDetails, ApplicationStatus, Job};

use crate::app::dto::{self, ApiJson, ApplicationListQuery, CreateApplicationRequest, HistoryQuery, UpdateStatusRequest};
use crate::app::errors::ApiError;
use crate::app::routes::common::{parse_id, parse_optional_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/applications", post(create_application).get(list_applications))
        .route("/applications/:id", get(get_application))
        .route("/applications/:id/status", patch(update_status))
        .route("/applications/:id/withdraw", post(withdraw_application))
        .route("/applications/:id/history", get(application_history))
}

/// POST /applications
pub async fn create_application(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateApplicationRequest>,
) -> Result<Response, ApiError> {
    let principal = principal.principal();
    require_role(principal, &[Role::Candidate, Role::Admin])?;

    let job_id: JobId = parse_id(&body.job_id, "job_id")?;
    let requested: Option<UserId> = parse_optional_id(body.candidate_id.as_deref(), "candidate_id")?;
    let candidate_id = resolve_applicant(&services, principal, requested).await?;

    let details = ApplicationDetails {
        cover_letter: body.cover_letter,
        resume_url: body.resume_url,
    };
    let application = services
        .lifecycle
        .create_application(job_id, candidate_id, details)
        .await?;

    Ok(dto::created(application, "application submitted"))
}

/// Candidates apply for themselves; admins apply on behalf of a candidate.
async fn resolve_applicant(
    services: &AppServices,
    principal: &Principal,
    requested: Option<UserId>,
) -> Result<UserId, ApiError> {
    if !principal.is_admin() {
        return match requested {
            Some(other) if other != principal.id => Err(ApiError::Forbidden(
                "candidates can only apply for themselves".to_string(),
            )),
            _ => Ok(principal.id),
        };
    }

    let candidate_id = requested.ok_or_else(|| ApiError::validation("candidate_id is required"))?;
    match services.store.find_user(candidate_id).await? {
        Some(user) if user.role == Role::Candidate => Ok(candidate_id),
        Some(_) => Err(ApiError::validation("candidate_id must refer to a candidate account")),
        None => Err(ApiError::NotFound("candidate")),
    }
}

/// GET /applications
///
/// Candidates see their own, hr users their company's, admins everything.
pub async fn list_applications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Response, ApiError> {
    let principal = principal.principal();
    let mut filter = ApplicationFilter {
        job_id: parse_optional_id(query.job_id.as_deref(), "job_id")?,
        status: query
            .status
            .as_deref()
            .map(str::parse::<ApplicationStatus>)
            .transpose()?,
        ..Default::default()
    };
    match principal.role {
        Role::Admin => {}
        Role::Hr => filter.company_id = Some(authz::hr_company(principal)?),
        Role::Candidate => filter.candidate_id = Some(principal.id),
    }

    let applications = services.store.list_applications(filter).await?;
    Ok(dto::ok(applications))
}

/// GET /applications/:id
pub async fn get_application(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (application, _) = load_visible(&services, principal.principal(), &id).await?;
    Ok(dto::ok(application))
}

/// PATCH /applications/:id/status
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Response, ApiError> {
    let principal = principal.principal();
    require_role(principal, &[Role::Hr, Role::Admin])?;

    let (application, job) = load_scoped(&services, &id).await?;
    authz::can_manage_application(principal, &job)?;

    let status: ApplicationStatus = body.status.parse()?;
    let updated = services
        .lifecycle
        .transition_status(application.id, status, body.notes, principal.id)
        .await?;

    Ok(dto::ok_with_message(updated, "application status updated"))
}

/// POST /applications/:id/withdraw
pub async fn withdraw_application(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let principal = principal.principal();
    require_role(principal, &[Role::Candidate])?;

    let id: ApplicationId = parse_id(&id, "id")?;
    let withdrawn = services.lifecycle.withdraw(id, principal.id).await?;

    Ok(dto::ok_with_message(withdrawn, "application withdrawn"))
}

/// GET /applications/:id/history
///
/// Newest first unless `?order=asc`.
pub async fn application_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let newest_first = match query.order.as_deref() {
        None | Some("desc") => true,
        Some("asc") => false,
        Some(_) => return Err(ApiError::validation("order must be 'asc' or 'desc'")),
    };

    let (application, _) = load_visible(&services, principal.principal(), &id).await?;
    let mut history = services.lifecycle.history(application.id).await?;
    if newest_first {
        history.reverse();
    }

    Ok(dto::ok(history))
}

async fn load_scoped(services: &AppServices, raw_id: &str) -> Result<(Application, Job), ApiError> {
    let id: ApplicationId = parse_id(raw_id, "id")?;
    let application = services
        .store
        .find_application(id)
        .await?
        .ok_or(ApiError::NotFound("application"))?;
    let job = services
        .store
        .find_job(application.job_id)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    Ok((application, job))
}

async fn load_visible(
    services: &AppServices,
    principal: &Principal,
    raw_id: &str,
) -> Result<(Application, Job), ApiError> {
    let scoped = match load_scoped(services, raw_id).await {
        Ok(scoped) => Some(scoped),
        Err(ApiError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };
    authz::can_view_application(principal, scoped.as_ref().map(|(a, j)| (a, j)))?;
    scoped.ok_or(ApiError::NotFound("application"))
}
