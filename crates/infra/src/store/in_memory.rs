use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hireflow_auth::{CredentialStore, CredentialStoreError, StoredCredential};
use hireflow_core::{ApplicationId, CompanyId, JobId, UserId};
use hireflow_recruiting::{
    Application, Company, Job, JobStatus, StatusChange, StatusHistoryEntry, Submission, UserAccount,
};

use super::r#trait::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, JobFilter, JobRepository, JobVisibility, StoreError,
    UserRepository,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    companies: HashMap<CompanyId, Company>,
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
    /// Global append order; filtered per application on read.
    history: Vec<StatusHistoryEntry>,
}

impl State {
    fn user_by_email(&self, email: &str) -> Option<&UserAccount> {
        self.users.values().find(|u| u.email == email)
    }
}

/// In-memory store.
///
/// Intended for tests/dev. One lock guards all tables, so every write is
/// trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>, CredentialStoreError> {
        Ok(self.read()?.user_by_email(email).map(UserAccount::credential))
    }

    async fn credential_by_id(&self, id: UserId) -> Result<Option<StoredCredential>, CredentialStoreError> {
        Ok(self.read()?.users.get(&id).map(UserAccount::credential))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.user_by_email(&account.email).is_some() {
            return Err(StoreError::Conflict(format!("email {} is already registered", account.email)));
        }
        if let Some(company_id) = account.company_id {
            if !state.companies.contains_key(&company_id) {
                return Err(StoreError::MissingReference(format!("company {company_id}")));
            }
        }
        state.users.insert(account.id, account.clone());
        Ok(())
    }

    async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                true
            }
            None => false,
        })
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(user) = self.write()?.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl CompanyRepository for InMemoryStore {
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        self.write()?.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.read()?.companies.get(&id).cloned())
    }
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.companies.contains_key(&job.company_id) {
            return Err(StoreError::MissingReference(format!("company {}", job.company_id)));
        }
        if !state.users.contains_key(&job.created_by) {
            return Err(StoreError::MissingReference(format!("user {}", job.created_by)));
        }
        state.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.read()?.jobs.get(&id).cloned())
    }

    async fn update_job(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.write()?;
        match state.jobs.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(StoreError::MissingReference(format!("job {}", job.id))),
        }
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, StoreError> {
        let state = self.read()?;
        let jobs = state
            .jobs
            .values()
            .filter(|job| filter.company_id.is_none_or(|c| job.company_id == c))
            .filter(|job| match filter.visibility {
                JobVisibility::All => true,
                JobVisibility::Published => job.status == JobStatus::Published,
                JobVisibility::PublishedOrCompany(c) => job.status == JobStatus::Published || job.company_id == c,
            })
            .cloned()
            .collect();
        Ok(newest_first(jobs, |j| j.created_at))
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryStore {
    async fn find_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.read()?.applications.get(&id).cloned())
    }

    async fn find_application_for(
        &self,
        job_id: JobId,
        candidate_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .read()?
            .applications
            .values()
            .find(|a| a.job_id == job_id && a.candidate_id == candidate_id)
            .cloned())
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let application = &submission.application;
        let mut state = self.write()?;

        if !state.jobs.contains_key(&application.job_id) {
            return Err(StoreError::MissingReference(format!("job {}", application.job_id)));
        }
        if !state.users.contains_key(&application.candidate_id) {
            return Err(StoreError::MissingReference(format!("user {}", application.candidate_id)));
        }
        let duplicate = state
            .applications
            .values()
            .any(|a| a.job_id == application.job_id && a.candidate_id == application.candidate_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "an application for this job already exists".to_string(),
            ));
        }

        state.applications.insert(application.id, application.clone());
        state.history.push(submission.entry.clone());
        Ok(())
    }

    async fn apply_status_change(&self, change: &StatusChange) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let Some(stored) = state.applications.get_mut(&change.application.id) else {
            return Err(StoreError::MissingReference(format!("application {}", change.application.id)));
        };
        if !change.expected.matches(stored.version) {
            return Err(StoreError::Concurrency(format!(
                "application {} is at version {}, expected {:?}",
                stored.id, stored.version, change.expected
            )));
        }

        *stored = change.application.clone();
        state.history.push(change.entry.clone());
        Ok(())
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>, StoreError> {
        let state = self.read()?;
        let applications = state
            .applications
            .values()
            .filter(|a| filter.candidate_id.is_none_or(|c| a.candidate_id == c))
            .filter(|a| filter.job_id.is_none_or(|j| a.job_id == j))
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| {
                filter.company_id.is_none_or(|c| {
                    state.jobs.get(&a.job_id).is_some_and(|job| job.company_id == c)
                })
            })
            .cloned()
            .collect();
        Ok(newest_first(applications, |a| a.applied_at))
    }

    async fn history(&self, application_id: ApplicationId) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|e| e.application_id == application_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use hireflow_auth::Role;
    use hireflow_core::ExpectedVersion;
    use hireflow_recruiting::{
        ApplicationDetails, ApplicationStatus, ChangeStatus, PostJob, RegisterCompany, SubmitApplication,
    };

    use super::*;

    fn account(email: &str, role: Role, company_id: Option<CompanyId>) -> UserAccount {
        UserAccount {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Test User".to_string(),
            role,
            permissions: None,
            company_id,
            is_active: true,
            email_verified: false,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    struct Seeded {
        store: InMemoryStore,
        hr: UserAccount,
        candidate: UserAccount,
        job: Job,
    }

    async fn seeded() -> Seeded {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let company = Company::register(RegisterCompany {
            name: "Acme".to_string(),
            website: None,
            occurred_at: now,
        })
        .unwrap();
        store.insert_company(&company).await.unwrap();

        let hr = account("hr@acme.test", Role::Hr, Some(company.id));
        let candidate = account("cand@example.test", Role::Candidate, None);
        store.insert_user(&hr).await.unwrap();
        store.insert_user(&candidate).await.unwrap();

        let job = Job::post(PostJob {
            company_id: company.id,
            title: "Engineer".to_string(),
            description: "Build things".to_string(),
            location: None,
            application_deadline: Some(now + Duration::days(7)),
            created_by: hr.id,
            occurred_at: now,
        })
        .unwrap()
        .publish(now)
        .unwrap();
        store.insert_job(&job).await.unwrap();

        Seeded { store, hr, candidate, job }
    }

    fn submission(job: &Job, candidate_id: UserId) -> Submission {
        Application::submit(
            job,
            SubmitApplication {
                job_id: job.id,
                candidate_id,
                details: ApplicationDetails::default(),
                occurred_at: Utc::now(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn email_lookup_is_exact_and_unique() {
        let s = seeded().await;
        let found = s.store.credential_by_email("cand@example.test").await.unwrap();
        assert_eq!(found.map(|c| c.user_id), Some(s.candidate.id));
        assert!(s.store.credential_by_email("CAND@example.test").await.unwrap().is_none());

        let dup = account("cand@example.test", Role::Candidate, None);
        assert!(matches!(s.store.insert_user(&dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn duplicate_submission_is_a_conflict_and_writes_nothing() {
        let s = seeded().await;
        s.store.insert_submission(&submission(&s.job, s.candidate.id)).await.unwrap();

        let again = submission(&s.job, s.candidate.id);
        let err = s.store.insert_submission(&again).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(s.store.find_application(again.application.id).await.unwrap().is_none());
        assert!(s.store.history(again.application.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_appending_history() {
        let s = seeded().await;
        let sub = submission(&s.job, s.candidate.id);
        s.store.insert_submission(&sub).await.unwrap();

        let cmd = |status| ChangeStatus {
            status,
            notes: None,
            acting: s.hr.id,
            occurred_at: Utc::now(),
        };
        let first = sub.application.transition(cmd(ApplicationStatus::Reviewing)).unwrap();
        let racing = sub.application.transition(cmd(ApplicationStatus::Rejected)).unwrap();

        s.store.apply_status_change(&first).await.unwrap();
        let err = s.store.apply_status_change(&racing).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let stored = s.store.find_application(sub.application.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Reviewing);
        let history = s.store.history(sub.application.id).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![ApplicationStatus::Pending, ApplicationStatus::Reviewing]);
    }

    #[tokio::test]
    async fn any_version_skips_the_check() {
        let s = seeded().await;
        let sub = submission(&s.job, s.candidate.id);
        s.store.insert_submission(&sub).await.unwrap();

        let mut change = sub
            .application
            .transition(ChangeStatus {
                status: ApplicationStatus::Shortlisted,
                notes: None,
                acting: s.hr.id,
                occurred_at: Utc::now(),
            })
            .unwrap();
        change.expected = ExpectedVersion::Exact(42);
        assert!(s.store.apply_status_change(&change).await.is_err());
        change.expected = ExpectedVersion::Any;
        s.store.apply_status_change(&change).await.unwrap();
    }

    #[tokio::test]
    async fn application_filters_are_conjunctive() {
        let s = seeded().await;
        s.store.insert_submission(&submission(&s.job, s.candidate.id)).await.unwrap();

        let by_company = ApplicationFilter {
            company_id: Some(s.job.company_id),
            ..Default::default()
        };
        assert_eq!(s.store.list_applications(by_company).await.unwrap().len(), 1);

        let other_company = ApplicationFilter {
            company_id: Some(CompanyId::new()),
            ..Default::default()
        };
        assert!(s.store.list_applications(other_company).await.unwrap().is_empty());

        let wrong_status = ApplicationFilter {
            candidate_id: Some(s.candidate.id),
            status: Some(ApplicationStatus::Hired),
            ..Default::default()
        };
        assert!(s.store.list_applications(wrong_status).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn job_visibility_hides_drafts_from_other_companies() {
        let s = seeded().await;
        let draft = Job::post(PostJob {
            company_id: s.job.company_id,
            title: "Draft role".to_string(),
            description: "Not yet".to_string(),
            location: None,
            application_deadline: None,
            created_by: s.hr.id,
            occurred_at: Utc::now(),
        })
        .unwrap();
        s.store.insert_job(&draft).await.unwrap();

        let public = JobFilter {
            visibility: JobVisibility::Published,
            company_id: None,
        };
        assert_eq!(s.store.list_jobs(public).await.unwrap().len(), 1);

        let own = JobFilter {
            visibility: JobVisibility::PublishedOrCompany(s.job.company_id),
            company_id: None,
        };
        assert_eq!(s.store.list_jobs(own).await.unwrap().len(), 2);

        let foreign = JobFilter {
            visibility: JobVisibility::PublishedOrCompany(CompanyId::new()),
            company_id: None,
        };
        assert_eq!(s.store.list_jobs(foreign).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deactivation_is_visible_to_credential_lookup() {
        let s = seeded().await;
        assert!(s.store.set_user_active(s.candidate.id, false).await.unwrap());
        let credential = s.store.credential_by_id(s.candidate.id).await.unwrap().unwrap();
        assert!(!credential.is_active);
        assert!(!s.store.set_user_active(UserId::new(), false).await.unwrap());
    }
}
