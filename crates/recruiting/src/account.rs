use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use hireflow_auth::{PermissionSet, Role, StoredCredential};
use hireflow_core::{CompanyId, DomainResult, UserId};

use crate::validate::Violations;

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    /// Capability mapping as stored (JSON text).
    pub permissions: Option<String>,
    pub company_id: Option<CompanyId>,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn credential(&self) -> StoredCredential {
        StoredCredential {
            user_id: self.id,
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            role: self.role,
            permissions: self.permissions.clone(),
            company_id: self.company_id,
            is_active: self.is_active,
            email_verified: self.email_verified,
        }
    }
}

/// Command: open a new account (self-registration or admin provisioning).
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub permissions: PermissionSet,
    pub company_id: Option<CompanyId>,
    pub email_verified: bool,
}

impl RegisterAccount {
    pub const MIN_PASSWORD: usize = 8;
    /// bcrypt ignores input past 72 bytes.
    pub const MAX_PASSWORD: usize = 72;

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Violations::new();

        if !is_plausible_email(&self.email) {
            v.reject("email", "must be a valid email address", self.email.as_str());
        }
        let len = self.password.len();
        if len < Self::MIN_PASSWORD {
            v.reject("password", "must be at least 8 characters", JsonValue::Null);
        } else if len > Self::MAX_PASSWORD {
            v.reject("password", "must be at most 72 bytes", JsonValue::Null);
        }
        v.required_text("full_name", &self.full_name, 200);

        match (self.role, self.company_id) {
            (Role::Hr, None) => v.reject("company_id", "is required for hr accounts", JsonValue::Null),
            (Role::Candidate, Some(company)) => {
                v.reject("company_id", "must not be set for candidate accounts", company.to_string())
            }
            _ => {}
        }

        v.finish()
    }

    /// Build the account once the password has been hashed.
    pub fn into_account(self, password_hash: String, now: DateTime<Utc>) -> UserAccount {
        let permissions = (!self.permissions.is_empty()).then(|| self.permissions.to_stored());
        UserAccount {
            id: UserId::new(),
            email: self.email,
            password_hash,
            full_name: self.full_name.trim().to_string(),
            role: self.role,
            permissions,
            company_id: self.company_id,
            is_active: true,
            email_verified: self.email_verified,
            last_login_at: None,
            created_at: now,
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > 254 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(email: &str, password: &str) -> RegisterAccount {
        RegisterAccount {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Sam Doe".to_string(),
            role: Role::Candidate,
            permissions: PermissionSet::new(),
            company_id: None,
            email_verified: false,
        }
    }

    #[test]
    fn accepts_reasonable_candidate() {
        assert!(candidate("sam@example.com", "long-enough").validate().is_ok());
    }

    #[test]
    fn rejects_bad_email_and_short_password_without_echoing_it() {
        let err = candidate("sam@localhost", "short").validate().unwrap_err();
        let v = err.violations();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].field, "email");
        assert_eq!(v[1].field, "password");
        assert_eq!(v[1].rejected_value, JsonValue::Null);
    }

    #[test]
    fn hr_needs_a_company() {
        let mut hr = candidate("hr@example.com", "long-enough");
        hr.role = Role::Hr;
        assert_eq!(hr.validate().unwrap_err().violations()[0].field, "company_id");

        hr.company_id = Some(CompanyId::new());
        assert!(hr.validate().is_ok());
    }

    #[test]
    fn empty_permissions_are_not_stored() {
        let account = candidate("sam@example.com", "long-enough").into_account("$2b$hash".to_string(), Utc::now());
        assert_eq!(account.permissions, None);
        assert!(account.is_active);
        assert_eq!(account.credential().user_id, account.id);
    }
}
