//! API-side authorization guards.
//!
//! Maps stored resources onto [`ResourceOwner`] and composes the
//! `hireflow_auth` checks in order: role, then permission/ownership.

use hireflow_auth::{Permission, Principal, ResourceOwner, Role, require_ownership, require_permission, require_role};
use hireflow_core::CompanyId;
use hireflow_recruiting::{Application, Job, JobStatus};

use crate::app::errors::ApiError;

/// An application is owned by its candidate and scoped to the job's company.
pub fn application_owner(application: &Application, job: &Job) -> ResourceOwner {
    ResourceOwner {
        owner_id: Some(application.candidate_id),
        company_id: Some(job.company_id),
    }
}

/// Read access: the candidate, hr of the job's company, or an admin.
///
/// A missing application is reported as not found, never as forbidden.
pub fn can_view_application(principal: &Principal, scoped: Option<(&Application, &Job)>) -> Result<(), ApiError> {
    let owner = scoped.map(|(application, job)| application_owner(application, job));
    require_ownership(principal, owner.as_ref())?;
    if scoped.is_none() {
        return Err(ApiError::NotFound("application"));
    }
    Ok(())
}

/// Status changes: hr of the job's company, or an admin.
pub fn can_manage_application(principal: &Principal, job: &Job) -> Result<(), ApiError> {
    require_role(principal, &[Role::Hr, Role::Admin])?;
    require_ownership(principal, Some(&ResourceOwner::company(job.company_id)))?;
    Ok(())
}

/// Job mutations: hr of the job's company holding `permission`, or an admin.
pub fn can_manage_job(principal: &Principal, job: &Job, permission: &Permission) -> Result<(), ApiError> {
    require_role(principal, &[Role::Hr, Role::Admin])?;
    require_permission(principal, std::slice::from_ref(permission))?;
    require_ownership(principal, Some(&ResourceOwner::company(job.company_id)))?;
    Ok(())
}

/// Published jobs are public; drafts and closed jobs are visible to their
/// company's hr and to admins.
pub fn can_view_job(principal: Option<&Principal>, job: &Job) -> bool {
    if job.status == JobStatus::Published {
        return true;
    }
    match principal {
        Some(p) => p.is_admin() || (p.role == Role::Hr && p.company_id == Some(job.company_id)),
        None => false,
    }
}

/// The company an hr user acts for.
pub fn hr_company(principal: &Principal) -> Result<CompanyId, ApiError> {
    principal
        .company_id
        .ok_or_else(|| ApiError::Forbidden("hr account is not attached to a company".to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use hireflow_auth::{PermissionSet, permissions::catalog};
    use hireflow_core::UserId;
    use hireflow_recruiting::PostJob;

    use super::*;

    fn principal(role: Role, company_id: Option<CompanyId>, permissions: PermissionSet) -> Principal {
        Principal {
            id: UserId::new(),
            email: "p@example.test".to_string(),
            role,
            permissions,
            company_id,
            is_active: true,
            email_verified: true,
        }
    }

    fn draft_job(company_id: CompanyId) -> Job {
        Job::post(PostJob {
            company_id,
            title: "Engineer".to_string(),
            description: "Build".to_string(),
            location: None,
            application_deadline: Some(Utc::now() + Duration::days(3)),
            created_by: UserId::new(),
            occurred_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn hr_needs_company_and_permission_to_publish() {
        let company = CompanyId::new();
        let job = draft_job(company);
        let publish = catalog::JOBS_PUBLISH;

        let without = principal(Role::Hr, Some(company), PermissionSet::new());
        assert!(matches!(can_manage_job(&without, &job, &publish), Err(ApiError::Forbidden(_))));

        let granted: PermissionSet = [publish.clone()].into_iter().collect();
        let own = principal(Role::Hr, Some(company), granted.clone());
        assert!(can_manage_job(&own, &job, &publish).is_ok());

        let foreign = principal(Role::Hr, Some(CompanyId::new()), granted);
        assert!(matches!(can_manage_job(&foreign, &job, &publish), Err(ApiError::Forbidden(_))));

        let admin = principal(Role::Admin, None, PermissionSet::new());
        assert!(can_manage_job(&admin, &job, &publish).is_ok());
    }

    #[test]
    fn drafts_are_hidden_from_outsiders() {
        let company = CompanyId::new();
        let job = draft_job(company);
        assert!(!can_view_job(None, &job));
        assert!(!can_view_job(
            Some(&principal(Role::Candidate, None, PermissionSet::new())),
            &job
        ));
        assert!(can_view_job(
            Some(&principal(Role::Hr, Some(company), PermissionSet::new())),
            &job
        ));
    }

    #[test]
    fn missing_application_is_not_found_for_everyone() {
        let admin = principal(Role::Admin, None, PermissionSet::new());
        assert!(matches!(can_view_application(&admin, None), Err(ApiError::NotFound(_))));
        let candidate = principal(Role::Candidate, None, PermissionSet::new());
        assert!(matches!(can_view_application(&candidate, None), Err(ApiError::NotFound(_))));
    }
}
