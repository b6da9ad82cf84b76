//! Application lifecycle orchestration.
//!
//! ```text
//! request
//!   ↓
//! 1. Load current state from the store
//!   ↓
//! 2. Decide (pure domain logic in `hireflow_recruiting`)
//!   ↓
//! 3. Persist application row + history entry as one unit
//!     (optimistic version check on transitions)
//! ```
//!
//! The transition graph is permissive: any non-terminal status may move to
//! any other status. Only terminal statuses and no-op moves are rejected.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use hireflow_core::{ApplicationId, DomainError, JobId, UserId};
use hireflow_recruiting::{
    Application, ApplicationDetails, ApplicationStatus, ChangeStatus, StatusHistoryEntry, SubmitApplication,
};

use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate application, or the application changed since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for LifecycleError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(resource) => LifecycleError::NotFound(resource),
            DomainError::Conflict(msg) => LifecycleError::Conflict(msg),
            other => LifecycleError::Validation(other),
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => LifecycleError::Conflict(msg),
            StoreError::Concurrency(_) => LifecycleError::Conflict(
                "application was modified concurrently; reload and retry".to_string(),
            ),
            StoreError::MissingReference(_) => LifecycleError::NotFound("application"),
            other => LifecycleError::Store(other),
        }
    }
}

/// Creates applications and moves them through their status lifecycle.
pub struct ApplicationLifecycle<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ApplicationLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ApplicationLifecycle<S>
where
    S: Store + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit an application for `candidate_id` to a published job.
    #[instrument(skip(self, details), fields(job_id = %job_id, candidate_id = %candidate_id), err)]
    pub async fn create_application(
        &self,
        job_id: JobId,
        candidate_id: UserId,
        details: ApplicationDetails,
    ) -> Result<Application, LifecycleError> {
        if self.store.find_application_for(job_id, candidate_id).await?.is_some() {
            return Err(LifecycleError::Conflict(
                "an application for this job already exists".to_string(),
            ));
        }
        let job = self
            .store
            .find_job(job_id)
            .await?
            .ok_or(LifecycleError::NotFound("job"))?;

        let submission = Application::submit(
            &job,
            SubmitApplication {
                job_id,
                candidate_id,
                details,
                occurred_at: Utc::now(),
            },
        )?;

        self.store
            .insert_submission(&submission)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => LifecycleError::NotFound("candidate"),
                other => other.into(),
            })?;

        tracing::info!(application_id = %submission.application.id, "application submitted");
        Ok(submission.application)
    }

    /// Move an application to `new_status` on behalf of `acting`.
    #[instrument(skip(self, notes), fields(application_id = %application_id, to = %new_status, acting = %acting), err)]
    pub async fn transition_status(
        &self,
        application_id: ApplicationId,
        new_status: ApplicationStatus,
        notes: Option<String>,
        acting: UserId,
    ) -> Result<Application, LifecycleError> {
        let current = self.load(application_id).await?;
        let change = current.transition(ChangeStatus {
            status: new_status,
            notes,
            acting,
            occurred_at: Utc::now(),
        })?;

        self.store.apply_status_change(&change).await?;

        tracing::info!(from = %current.status, to = %new_status, "application status changed");
        Ok(change.application)
    }

    /// Self-service withdrawal by the owning candidate.
    #[instrument(skip(self), fields(application_id = %application_id, candidate_id = %candidate_id), err)]
    pub async fn withdraw(
        &self,
        application_id: ApplicationId,
        candidate_id: UserId,
    ) -> Result<Application, LifecycleError> {
        let current = self.load(application_id).await?;
        let change = current.withdraw(candidate_id, Utc::now())?;

        self.store.apply_status_change(&change).await?;

        tracing::info!(from = %current.status, "application withdrawn");
        Ok(change.application)
    }

    /// Every history entry of an application, in creation order.
    pub async fn history(&self, application_id: ApplicationId) -> Result<Vec<StatusHistoryEntry>, LifecycleError> {
        self.load(application_id).await?;
        Ok(self.store.history(application_id).await?)
    }

    async fn load(&self, application_id: ApplicationId) -> Result<Application, LifecycleError> {
        self.store
            .find_application(application_id)
            .await?
            .ok_or(LifecycleError::NotFound("application"))
    }
}
