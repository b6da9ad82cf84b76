use serde::Serialize;

use hireflow_core::{CompanyId, UserId};

use crate::{PermissionSet, Role};

/// Resolved identity of a request.
///
/// Built fresh from the persisted user on every request and dropped with the
/// response; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub permissions: PermissionSet,
    /// Ownership scope for hr users.
    pub company_id: Option<CompanyId>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
