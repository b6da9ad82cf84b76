use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use hireflow_auth::{CredentialStore, CredentialStoreError};
use hireflow_core::{ApplicationId, CompanyId, JobId, UserId};
use hireflow_recruiting::{
    Application, ApplicationStatus, Company, Job, StatusChange, StatusHistoryEntry, Submission, UserAccount,
};

/// Data-access failure.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, state machine rules).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate email, duplicate application, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record changed since it was read (optimistic concurrency).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The write referenced (or targeted) a record that does not exist.
    #[error("referenced record not found: {0}")]
    MissingReference(String),

    /// A stored value could not be mapped back into the domain model.
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    /// Connection pool exhausted, closed, or the connection dropped.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<StoreError> for CredentialStoreError {
    fn from(value: StoreError) -> Self {
        CredentialStoreError(value.to_string())
    }
}

/// Which jobs a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobVisibility {
    /// Every job regardless of status (admin).
    All,
    /// Published jobs only (anonymous visitors, candidates).
    Published,
    /// Published jobs plus every job of one company (hr).
    PublishedOrCompany(CompanyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobFilter {
    pub visibility: JobVisibility,
    pub company_id: Option<CompanyId>,
}

/// Conjunctive application listing filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub candidate_id: Option<UserId>,
    /// Company owning the application's job.
    pub company_id: Option<CompanyId>,
    pub job_id: Option<JobId>,
    pub status: Option<ApplicationStatus>,
}

#[async_trait]
pub trait UserRepository: CredentialStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    /// Fails `Conflict` when the email is taken.
    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError>;

    /// Returns `false` when no such user exists.
    async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool, StoreError>;

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError>;

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fails `MissingReference` when the company or creator does not exist.
    async fn insert_job(&self, job: &Job) -> Result<(), StoreError>;

    async fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    /// Persist a status change of an existing job.
    async fn update_job(&self, job: &Job) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, StoreError>;
}

/// Applications and their append-only status history.
///
/// Both write operations are single units of work: the application row and
/// its history entry are committed together or not at all.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError>;

    async fn find_application_for(
        &self,
        job_id: JobId,
        candidate_id: UserId,
    ) -> Result<Option<Application>, StoreError>;

    /// Persist a new application with its initial history entry.
    ///
    /// Fails `Conflict` when `(job_id, candidate_id)` already has an application.
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Persist a status transition with its history entry.
    ///
    /// Fails `Concurrency` when the stored version no longer matches
    /// `change.expected`, and `MissingReference` when the application is gone.
    async fn apply_status_change(&self, change: &StatusChange) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>, StoreError>;

    /// Every entry of one application, in creation order.
    async fn history(&self, application_id: ApplicationId) -> Result<Vec<StatusHistoryEntry>, StoreError>;
}

/// The complete data-access interface injected into services.
pub trait Store: UserRepository + CompanyRepository + JobRepository + ApplicationRepository {}

impl<T> Store for T where T: UserRepository + CompanyRepository + JobRepository + ApplicationRepository {}
