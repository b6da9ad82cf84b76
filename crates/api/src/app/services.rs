//! Service wiring: store selection, session service, lifecycle manager.
//!
//! Everything is constructed explicitly from [`AppConfig`]; handlers reach
//! the store only through [`AppServices`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;

use hireflow_auth::{Hs256Jwt, PasswordError, PasswordHasher, PermissionSet, Role, SessionService};
use hireflow_core::DomainError;
use hireflow_infra::{
    AppConfig, ApplicationLifecycle, BootstrapAdmin, InMemoryStore, PostgresStore, Store, StoreError, db,
};
use hireflow_recruiting::{RegisterAccount, UserAccount};

use crate::app::errors::ApiError;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("bootstrap admin rejected: {0}")]
    Bootstrap(String),
}

pub struct AppServices {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub sessions: SessionService<dyn Store>,
    pub lifecycle: ApplicationLifecycle<dyn Store>,
}

impl AppServices {
    pub async fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, ServicesError> {
        let jwt = Arc::new(Hs256Jwt::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours),
        ));
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        let sessions = SessionService::new(Arc::clone(&store), jwt, hasher).await?;

        Ok(Self {
            sessions,
            lifecycle: ApplicationLifecycle::new(Arc::clone(&store)),
            store,
            config,
        })
    }

    /// Select the store from configuration, migrate it, and seed the
    /// bootstrap admin when configured.
    pub async fn from_config(config: AppConfig) -> Result<Self, ServicesError> {
        let store: Arc<dyn Store> = match &config.database {
            Some(database) => {
                let pool = db::connect_pool(database).await?;
                let store = PostgresStore::new(pool);
                store.migrate().await?;
                tracing::info!(max_connections = database.max_connections, "using Postgres store");
                Arc::new(store)
            }
            None => {
                tracing::info!("using in-memory store");
                Arc::new(InMemoryStore::new())
            }
        };

        let services = Self::new(config, store).await?;
        if let Some(admin) = services.config.bootstrap_admin.clone() {
            services.ensure_bootstrap_admin(&admin).await?;
        }
        Ok(services)
    }

    pub fn store_kind(&self) -> &'static str {
        if self.config.database.is_some() { "postgres" } else { "memory" }
    }

    async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), ServicesError> {
        let existing = self
            .store
            .credential_by_email(&admin.email)
            .await
            .map_err(|e| ServicesError::Store(StoreError::Database(e.0)))?;
        if existing.is_some() {
            tracing::debug!(email = %admin.email, "bootstrap admin already present");
            return Ok(());
        }

        let cmd = RegisterAccount {
            email: admin.email.clone(),
            password: admin.password.clone(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            permissions: PermissionSet::new(),
            company_id: None,
            email_verified: true,
        };
        let account = self
            .register_account(cmd)
            .await
            .map_err(|e| ServicesError::Bootstrap(e.to_string()))?;
        tracing::info!(user_id = %account.id, email = %account.email, "bootstrap admin created");
        Ok(())
    }

    /// Validate, hash and persist a new account.
    pub async fn register_account(&self, cmd: RegisterAccount) -> Result<UserAccount, ApiError> {
        cmd.validate()?;
        if let Some(company_id) = cmd.company_id {
            if self.store.find_company(company_id).await?.is_none() {
                return Err(DomainError::not_found("company").into());
            }
        }

        let password_hash = self.sessions.hasher().hash(&cmd.password).await?;
        let account = cmd.into_account(password_hash, Utc::now());
        self.store.insert_user(&account).await?;

        tracing::info!(user_id = %account.id, role = %account.role, "account registered");
        Ok(account)
    }
}
