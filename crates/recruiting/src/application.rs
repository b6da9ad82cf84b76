use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hireflow_core::{
    ApplicationId, DomainError, DomainResult, ExpectedVersion, HistoryEntryId, JobId, UserId,
};

use crate::job::Job;
use crate::validate::Violations;

/// Note recorded on the initial history entry of every application.
pub const SUBMITTED_NOTE: &str = "Application submitted";

/// Application status lifecycle.
///
/// Main chain: `pending → reviewing → shortlisted → interview_scheduled →
/// interviewed → offered → hired`. `rejected` and `withdrawn` are reachable
/// from any non-terminal status. `hired`, `rejected` and `withdrawn` are
/// terminal.
///
/// Moves between non-terminal statuses are not restricted to the forward
/// direction: reviewers may step an application back (e.g. `offered →
/// reviewing`) to correct a mistaken advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    InterviewScheduled,
    Interviewed,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 9] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

impl FromStr for ApplicationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown application status '{s}'")))
    }
}

impl core::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate-supplied content of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

impl ApplicationDetails {
    pub const MAX_COVER_LETTER: usize = 10_000;

    pub fn validate(&self) -> DomainResult<()> {
        let mut v = Violations::new();
        v.optional_text("cover_letter", self.cover_letter.as_deref(), Self::MAX_COVER_LETTER);
        v.optional_url("resume_url", self.resume_url.as_deref());
        v.finish()
    }
}

/// One candidate's submission to one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every accepted status transition.
    pub version: u64,
}

/// Immutable audit record of one accepted status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: HistoryEntryId,
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Command: submit an application to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitApplication {
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub details: ApplicationDetails,
    pub occurred_at: DateTime<Utc>,
}

/// A new application together with its initial history entry.
///
/// Both must be persisted in one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub application: Application,
    pub entry: StatusHistoryEntry,
}

/// Command: move an application to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatus {
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub acting: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// An accepted transition: the updated application, its history entry, and
/// the version the stored row must still be at for the write to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub expected: ExpectedVersion,
    pub application: Application,
    pub entry: StatusHistoryEntry,
}

impl Application {
    pub const MAX_NOTES: usize = 2_000;

    /// Decide a submission against `job`.
    ///
    /// Fails `NotFound` when the job is not accepting applications and
    /// `Validation` when its deadline has passed or the details are invalid.
    /// Uniqueness per `(job, candidate)` is enforced by storage.
    pub fn submit(job: &Job, cmd: SubmitApplication) -> DomainResult<Submission> {
        if job.id != cmd.job_id || !job.is_accepting_applications() {
            return Err(DomainError::not_found("job"));
        }
        if job.deadline_passed(cmd.occurred_at) {
            return Err(DomainError::validation("the application deadline for this job has passed"));
        }
        cmd.details.validate()?;

        let application = Application {
            id: ApplicationId::new(),
            job_id: cmd.job_id,
            candidate_id: cmd.candidate_id,
            status: ApplicationStatus::Pending,
            cover_letter: cmd.details.cover_letter,
            resume_url: cmd.details.resume_url,
            applied_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
            version: 1,
        };
        let entry = StatusHistoryEntry {
            id: HistoryEntryId::new(),
            application_id: application.id,
            status: ApplicationStatus::Pending,
            notes: Some(SUBMITTED_NOTE.to_string()),
            updated_by: cmd.candidate_id,
            created_at: cmd.occurred_at,
        };
        Ok(Submission { application, entry })
    }

    pub fn is_owned_by(&self, candidate_id: UserId) -> bool {
        self.candidate_id == candidate_id
    }

    /// Whether moving to `to` is allowed from the current status.
    pub fn check_transition(&self, to: ApplicationStatus) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "application is {} and can no longer change status",
                self.status
            )));
        }
        if self.status == to {
            return Err(DomainError::validation(format!("application is already {to}")));
        }
        Ok(())
    }

    /// Decide a status transition (pure; the caller persists the result).
    pub fn transition(&self, cmd: ChangeStatus) -> DomainResult<StatusChange> {
        self.check_transition(cmd.status)?;

        let notes = cmd.notes.filter(|n| !n.trim().is_empty());
        let mut v = Violations::new();
        v.optional_text("notes", notes.as_deref(), Self::MAX_NOTES);
        v.finish()?;

        let mut application = self.clone();
        application.status = cmd.status;
        application.updated_at = cmd.occurred_at;
        application.version = self.version + 1;

        let entry = StatusHistoryEntry {
            id: HistoryEntryId::new(),
            application_id: self.id,
            status: cmd.status,
            notes,
            updated_by: cmd.acting,
            created_at: cmd.occurred_at,
        };

        Ok(StatusChange {
            expected: ExpectedVersion::Exact(self.version),
            application,
            entry,
        })
    }

    /// Decide a self-service withdrawal by `candidate_id`.
    pub fn withdraw(&self, candidate_id: UserId, occurred_at: DateTime<Utc>) -> DomainResult<StatusChange> {
        if !self.is_owned_by(candidate_id) {
            return Err(DomainError::validation("only the applicant can withdraw this application"));
        }
        self.transition(ChangeStatus {
            status: ApplicationStatus::Withdrawn,
            notes: Some("Withdrawn by candidate".to_string()),
            acting: candidate_id,
            occurred_at,
        })
    }
}
