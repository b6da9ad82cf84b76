use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hireflow_core::{CompanyId, DomainError, DomainResult, JobId, UserId};

use crate::validate::Violations;

/// Job posting lifecycle: `draft → published → closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    Published,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Closed => "closed",
        }
    }
}

impl core::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(JobStatus::Draft),
            "published" => Ok(JobStatus::Published),
            "closed" => Ok(JobStatus::Closed),
            other => Err(DomainError::validation(format!("unknown job status '{other}'"))),
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job posting owned by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub status: JobStatus,
    pub application_deadline: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Command: post a new (draft) job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostJob {
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl Job {
    pub fn post(cmd: PostJob) -> DomainResult<Job> {
        let mut v = Violations::new();
        v.required_text("title", &cmd.title, 200);
        v.required_text("description", &cmd.description, 20_000);
        v.optional_text("location", cmd.location.as_deref(), 200);
        if let Some(deadline) = cmd.application_deadline {
            if deadline <= cmd.occurred_at {
                v.reject("application_deadline", "must be in the future", deadline.to_rfc3339());
            }
        }
        v.finish()?;

        Ok(Job {
            id: JobId::new(),
            company_id: cmd.company_id,
            title: cmd.title.trim().to_string(),
            description: cmd.description,
            location: cmd.location,
            status: JobStatus::Draft,
            application_deadline: cmd.application_deadline,
            created_by: cmd.created_by,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    pub fn is_accepting_applications(&self) -> bool {
        self.status == JobStatus::Published
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.application_deadline.is_some_and(|deadline| now > deadline)
    }

    pub fn publish(&self, now: DateTime<Utc>) -> DomainResult<Job> {
        match self.status {
            JobStatus::Draft => {}
            JobStatus::Published => return Err(DomainError::validation("job is already published")),
            JobStatus::Closed => return Err(DomainError::validation("a closed job cannot be republished")),
        }
        if self.deadline_passed(now) {
            return Err(DomainError::validation("cannot publish a job whose deadline has passed"));
        }
        Ok(Job {
            status: JobStatus::Published,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn close(&self, now: DateTime<Utc>) -> DomainResult<Job> {
        if self.status == JobStatus::Closed {
            return Err(DomainError::validation("job is already closed"));
        }
        Ok(Job {
            status: JobStatus::Closed,
            updated_at: now,
            ..self.clone()
        })
    }
}
