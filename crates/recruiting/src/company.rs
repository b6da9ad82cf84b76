use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hireflow_core::{CompanyId, DomainResult};

use crate::validate::Violations;

/// Employer organisation; hr users and jobs are scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCompany {
    pub name: String,
    pub website: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Company {
    pub fn register(cmd: RegisterCompany) -> DomainResult<Company> {
        let mut v = Violations::new();
        v.required_text("name", &cmd.name, 200);
        v.optional_url("website", cmd.website.as_deref());
        v.finish()?;

        Ok(Company {
            id: CompanyId::new(),
            name: cmd.name.trim().to_string(),
            website: cmd.website,
            created_at: cmd.occurred_at,
        })
    }
}
