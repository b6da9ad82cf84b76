//! Role, permission and ownership checks.
//!
//! Checks compose in the order authentication → role → permission/ownership.
//! All of them are pure: no IO, no panics.

use thiserror::Error;

use hireflow_core::{CompanyId, UserId};

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' is not allowed (requires one of: {required})")]
    RoleNotAllowed { role: Role, required: String },

    #[error("forbidden: missing permission(s) {0}")]
    MissingPermissions(String),

    #[error("forbidden: resource belongs to another user or company")]
    NotOwner,

    #[error("resource not found")]
    NotFound,
}

/// Who a resource belongs to, for ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner {
    /// Owning user (e.g. the candidate of an application).
    pub owner_id: Option<UserId>,
    /// Owning company for company-scoped resources (jobs, applications).
    pub company_id: Option<CompanyId>,
}

impl ResourceOwner {
    pub fn user(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            company_id: None,
        }
    }

    pub fn company(company_id: CompanyId) -> Self {
        Self {
            owner_id: None,
            company_id: Some(company_id),
        }
    }
}

/// Allow iff the principal's role is one of `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        return Ok(());
    }

    let required = allowed.iter().map(Role::as_str).collect::<Vec<_>>().join(", ");
    tracing::warn!(
        principal_id = %principal.id,
        role = %principal.role,
        required = %required,
        "role check denied"
    );
    Err(AuthzError::RoleNotAllowed {
        role: principal.role,
        required,
    })
}

/// Allow iff every permission in `required` is held. Admin always passes.
pub fn require_permission(principal: &Principal, required: &[Permission]) -> Result<(), AuthzError> {
    if principal.is_admin() {
        return Ok(());
    }

    let missing = principal.permissions.missing(required);
    if missing.is_empty() {
        return Ok(());
    }

    let missing = missing.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ");
    tracing::warn!(
        principal_id = %principal.id,
        role = %principal.role,
        missing = %missing,
        "permission check denied"
    );
    Err(AuthzError::MissingPermissions(missing))
}

/// Allow iff the principal owns `resource` directly or shares its company.
///
/// Admin always passes. `None` means the resource does not exist.
pub fn require_ownership(principal: &Principal, resource: Option<&ResourceOwner>) -> Result<(), AuthzError> {
    if principal.is_admin() {
        return Ok(());
    }

    let resource = resource.ok_or(AuthzError::NotFound)?;

    let owns = resource.owner_id == Some(principal.id);
    let same_company = principal.company_id.is_some() && resource.company_id == principal.company_id;
    if owns || same_company {
        return Ok(());
    }

    tracing::warn!(
        principal_id = %principal.id,
        role = %principal.role,
        owner_id = ?resource.owner_id,
        company_id = ?resource.company_id,
        "ownership check denied"
    );
    Err(AuthzError::NotOwner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PermissionSet;
    use crate::permissions::catalog;

    fn principal(role: Role, permissions: &[Permission], company_id: Option<CompanyId>) -> Principal {
        Principal {
            id: UserId::new(),
            email: format!("{}@example.com", role),
            role,
            permissions: permissions.iter().cloned().collect::<PermissionSet>(),
            company_id,
            is_active: true,
            email_verified: true,
        }
    }

    #[test]
    fn role_must_be_in_allowed_set() {
        let hr = principal(Role::Hr, &[], None);
        assert!(require_role(&hr, &[Role::Hr, Role::Admin]).is_ok());

        let err = require_role(&hr, &[Role::Candidate]).unwrap_err();
        assert_eq!(
            err,
            AuthzError::RoleNotAllowed {
                role: Role::Hr,
                required: "candidate".to_string()
            }
        );
    }

    #[test]
    fn admin_bypasses_permission_checks() {
        let admin = principal(Role::Admin, &[], None);
        assert!(require_permission(&admin, &[Permission::new("anything")]).is_ok());
    }

    #[test]
    fn permissions_are_conjunctive() {
        let hr = principal(Role::Hr, &[catalog::JOBS_CREATE], None);
        assert!(require_permission(&hr, &[catalog::JOBS_CREATE]).is_ok());
        assert!(require_permission(&hr, &[]).is_ok());
        assert_eq!(
            require_permission(&hr, &[catalog::JOBS_CREATE, catalog::JOBS_PUBLISH]),
            Err(AuthzError::MissingPermissions("jobs.publish".to_string()))
        );
    }

    #[test]
    fn owner_passes_and_stranger_fails() {
        let candidate = principal(Role::Candidate, &[], None);
        let own = ResourceOwner::user(candidate.id);
        let other = ResourceOwner::user(UserId::new());

        assert!(require_ownership(&candidate, Some(&own)).is_ok());
        assert_eq!(require_ownership(&candidate, Some(&other)), Err(AuthzError::NotOwner));
        assert_eq!(require_ownership(&candidate, None), Err(AuthzError::NotFound));
    }

    #[test]
    fn company_scope_grants_hr_access() {
        let company = CompanyId::new();
        let hr = principal(Role::Hr, &[], Some(company));
        let resource = ResourceOwner {
            owner_id: Some(UserId::new()),
            company_id: Some(company),
        };
        assert!(require_ownership(&hr, Some(&resource)).is_ok());

        let elsewhere = ResourceOwner::company(CompanyId::new());
        assert_eq!(require_ownership(&hr, Some(&elsewhere)), Err(AuthzError::NotOwner));
    }

    #[test]
    fn missing_company_on_both_sides_is_not_a_match() {
        let hr = principal(Role::Hr, &[], None);
        let resource = ResourceOwner {
            owner_id: Some(UserId::new()),
            company_id: None,
        };
        assert_eq!(require_ownership(&hr, Some(&resource)), Err(AuthzError::NotOwner));
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = principal(Role::Admin, &[], None);
        assert!(require_ownership(&admin, Some(&ResourceOwner::user(UserId::new()))).is_ok());
    }
}
