//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (check constraint violation) | `23514` | `Corrupt` |
//! | Database (other) | Any other | `Database` |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unavailable` |
//! | Other | N/A | `Database` |
//!
//! ## Atomicity
//!
//! Submissions and status changes run inside one transaction each. A dropped
//! transaction (error, cancelled request) rolls back, so an application row is
//! never visible without the history entry that explains it.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use hireflow_auth::{CredentialStore, CredentialStoreError, StoredCredential};
use hireflow_core::{ApplicationId, CompanyId, ExpectedVersion, HistoryEntryId, JobId, UserId};
use hireflow_recruiting::{
    Application, Company, Job, StatusChange, StatusHistoryEntry, Submission, UserAccount,
};

use super::r#trait::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, JobFilter, JobRepository, JobVisibility, StoreError,
    UserRepository,
};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, permissions, company_id, \
     is_active, email_verified, last_login_at, created_at";

const JOB_COLUMNS: &str = "id, company_id, title, description, location, status, application_deadline, \
     created_by, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "a.id, a.job_id, a.candidate_id, a.status, a.cover_letter, a.resume_url, \
     a.applied_at, a.updated_at, a.version";

/// Postgres-backed store over a shared connection pool.
///
/// `Send + Sync`; clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create missing tables, indexes, and the history immutability trigger.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(include_str!("../../migrations/0001_init.sql"))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_user(&self, clause: &str, bind: UserKey<'_>) -> Result<Option<UserAccount>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let query = sqlx::query(&sql);
        let query = match bind {
            UserKey::Id(id) => query.bind(*id.as_uuid()),
            UserKey::Email(email) => query.bind(email),
        };
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

enum UserKey<'a> {
    Id(UserId),
    Email(&'a str),
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>, CredentialStoreError> {
        let user = self
            .fetch_user("email = $1", UserKey::Email(email))
            .await?;
        Ok(user.as_ref().map(UserAccount::credential))
    }

    async fn credential_by_id(&self, id: UserId) -> Result<Option<StoredCredential>, CredentialStoreError> {
        let user = self.fetch_user("id = $1", UserKey::Id(id)).await?;
        Ok(user.as_ref().map(UserAccount::credential))
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        self.fetch_user("id = $1", UserKey::Id(id)).await
    }

    #[instrument(skip(self, account), fields(user_id = %account.id, role = %account.role), err)]
    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, full_name, role, permissions, company_id,
                is_active, email_verified, last_login_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(account.role.as_str())
        .bind(account.permissions.as_deref())
        .bind(account.company_id.map(|c| *c.as_uuid()))
        .bind(account.is_active)
        .bind(account.email_verified)
        .bind(account.last_login_at)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_user", e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("email {} is already registered", account.email))
            }
            other => other,
        })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_active", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("record_login", e))?;
        Ok(())
    }
}

#[async_trait]
impl CompanyRepository for PostgresStore {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO companies (id, name, website, created_at) VALUES ($1, $2, $3, $4)")
            .bind(*company.id.as_uuid())
            .bind(&company.name)
            .bind(company.website.as_deref())
            .bind(company.created_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(())
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT id, name, website, created_at FROM companies WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_company", e))?;
        row.as_ref().map(company_from_row).transpose()
    }
}

#[async_trait]
impl JobRepository for PostgresStore {
    #[instrument(skip(self, job), fields(job_id = %job.id, company_id = %job.company_id), err)]
    async fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, company_id, title, description, location, status,
                application_deadline, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*job.id.as_uuid())
        .bind(*job.company_id.as_uuid())
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.location.as_deref())
        .bind(job.status.as_str())
        .bind(job.application_deadline)
        .bind(*job.created_by.as_uuid())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_job", e))?;
        Ok(())
    }

    async fn find_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_job", e))?;
        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, status = %job.status), err)]
    async fn update_job(&self, job: &Job) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE jobs SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(*job.id.as_uuid())
            .bind(job.status.as_str())
            .bind(job.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_job", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingReference(format!("job {}", job.id)));
        }
        Ok(())
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>, StoreError> {
        let (published_only, also_company) = match filter.visibility {
            JobVisibility::All => (false, None),
            JobVisibility::Published => (true, None),
            JobVisibility::PublishedOrCompany(c) => (true, Some(*c.as_uuid())),
        };
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE ($1::UUID IS NULL OR company_id = $1)
              AND (NOT $2 OR status = 'published' OR company_id = $3)
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.company_id.map(|c| *c.as_uuid()))
            .bind(published_only)
            .bind(also_company)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_jobs", e))?;
        rows.iter().map(job_from_row).collect()
    }
}

#[async_trait]
impl ApplicationRepository for PostgresStore {
    async fn find_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications a WHERE a.id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_application", e))?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn find_application_for(
        &self,
        job_id: JobId,
        candidate_id: UserId,
    ) -> Result<Option<Application>, StoreError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications a WHERE a.job_id = $1 AND a.candidate_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(*job_id.as_uuid())
            .bind(*candidate_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_application_for", e))?;
        row.as_ref().map(application_from_row).transpose()
    }

    #[instrument(
        skip(self, submission),
        fields(
            application_id = %submission.application.id,
            job_id = %submission.application.job_id,
            candidate_id = %submission.application.candidate_id
        ),
        err
    )]
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let application = &submission.application;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, job_id, candidate_id, status, cover_letter, resume_url,
                applied_at, updated_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*application.id.as_uuid())
        .bind(*application.job_id.as_uuid())
        .bind(*application.candidate_id.as_uuid())
        .bind(application.status.as_str())
        .bind(application.cover_letter.as_deref())
        .bind(application.resume_url.as_deref())
        .bind(application.applied_at)
        .bind(application.updated_at)
        .bind(version_to_db(application.version)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| match map_sqlx_error("insert_application", e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict("an application for this job already exists".to_string())
            }
            other => other,
        })?;

        insert_history_entry(&mut tx, &submission.entry).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, change),
        fields(
            application_id = %change.application.id,
            status = %change.application.status,
            expected_version = ?change.expected
        ),
        err
    )]
    async fn apply_status_change(&self, change: &StatusChange) -> Result<(), StoreError> {
        let application = &change.application;
        let expected = match change.expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(version_to_db(v)?),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE applications
            SET status = $2, updated_at = $3, version = $4
            WHERE id = $1 AND ($5::BIGINT IS NULL OR version = $5)
            "#,
        )
        .bind(*application.id.as_uuid())
        .bind(application.status.as_str())
        .bind(application.updated_at)
        .bind(version_to_db(application.version)?)
        .bind(expected)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_application_status", e))?;

        if updated.rows_affected() == 0 {
            let current: Option<i64> = sqlx::query_scalar("SELECT version FROM applications WHERE id = $1")
                .bind(*application.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_application_version", e))?;
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(match current {
                None => StoreError::MissingReference(format!("application {}", application.id)),
                Some(found) => StoreError::Concurrency(format!(
                    "application {} is at version {found}, expected {:?}",
                    application.id, change.expected
                )),
            });
        }

        insert_history_entry(&mut tx, &change.entry).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> Result<Vec<Application>, StoreError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE ($1::UUID IS NULL OR a.candidate_id = $1)
              AND ($2::UUID IS NULL OR j.company_id = $2)
              AND ($3::UUID IS NULL OR a.job_id = $3)
              AND ($4::TEXT IS NULL OR a.status = $4)
            ORDER BY a.applied_at DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.candidate_id.map(|c| *c.as_uuid()))
            .bind(filter.company_id.map(|c| *c.as_uuid()))
            .bind(filter.job_id.map(|j| *j.as_uuid()))
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_applications", e))?;
        rows.iter().map(application_from_row).collect()
    }

    async fn history(&self, application_id: ApplicationId) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, status, notes, updated_by, created_at
            FROM application_status_history
            WHERE application_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(*application_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("history", e))?;
        rows.iter().map(history_from_row).collect()
    }
}

async fn insert_history_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &StatusHistoryEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO application_status_history (id, application_id, status, notes, updated_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(*entry.id.as_uuid())
    .bind(*entry.application_id.as_uuid())
    .bind(entry.status.as_str())
    .bind(entry.notes.as_deref())
    .bind(*entry.updated_by.as_uuid())
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_history_entry", e))?;
    Ok(())
}

fn version_to_db(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::Corrupt(format!("version {version} exceeds BIGINT")))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
}

fn parsed<T>(row: &PgRow, name: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    Ok(UserAccount {
        id: UserId::from_uuid(column(row, "id")?),
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        full_name: column(row, "full_name")?,
        role: parsed(row, "role")?,
        permissions: column(row, "permissions")?,
        company_id: column::<Option<Uuid>>(row, "company_id")?.map(CompanyId::from_uuid),
        is_active: column(row, "is_active")?,
        email_verified: column(row, "email_verified")?,
        last_login_at: column(row, "last_login_at")?,
        created_at: column(row, "created_at")?,
    })
}

fn company_from_row(row: &PgRow) -> Result<Company, StoreError> {
    Ok(Company {
        id: CompanyId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        website: column(row, "website")?,
        created_at: column(row, "created_at")?,
    })
}

fn job_from_row(row: &PgRow) -> Result<Job, StoreError> {
    Ok(Job {
        id: JobId::from_uuid(column(row, "id")?),
        company_id: CompanyId::from_uuid(column(row, "company_id")?),
        title: column(row, "title")?,
        description: column(row, "description")?,
        location: column(row, "location")?,
        status: parsed(row, "status")?,
        application_deadline: column(row, "application_deadline")?,
        created_by: UserId::from_uuid(column(row, "created_by")?),
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn application_from_row(row: &PgRow) -> Result<Application, StoreError> {
    let version: i64 = column(row, "version")?;
    Ok(Application {
        id: ApplicationId::from_uuid(column(row, "id")?),
        job_id: JobId::from_uuid(column(row, "job_id")?),
        candidate_id: UserId::from_uuid(column(row, "candidate_id")?),
        status: parsed(row, "status")?,
        cover_letter: column(row, "cover_letter")?,
        resume_url: column(row, "resume_url")?,
        applied_at: column(row, "applied_at")?,
        updated_at: column(row, "updated_at")?,
        version: u64::try_from(version)
            .map_err(|_| StoreError::Corrupt(format!("negative application version {version}")))?,
    })
}

fn history_from_row(row: &PgRow) -> Result<StatusHistoryEntry, StoreError> {
    Ok(StatusHistoryEntry {
        id: HistoryEntryId::from_uuid(column(row, "id")?),
        application_id: ApplicationId::from_uuid(column(row, "application_id")?),
        status: parsed(row, "status")?,
        notes: column(row, "notes")?,
        updated_by: UserId::from_uuid(column(row, "updated_by")?),
        created_at: column(row, "created_at")?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                Some("23514") => StoreError::Corrupt(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }

    #[test]
    fn versions_beyond_bigint_are_rejected() {
        assert_eq!(version_to_db(7).unwrap(), 7);
        assert!(matches!(version_to_db(u64::MAX), Err(StoreError::Corrupt(_))));
    }
}
