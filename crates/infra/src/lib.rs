//! `hireflow-infra`: configuration, storage, and lifecycle orchestration.
//!
//! Everything with IO lives here; the domain crates stay pure.

pub mod config;
pub mod db;
pub mod lifecycle;
pub mod store;

pub use config::{AppConfig, BootstrapAdmin, ConfigError, DatabaseConfig, Environment};
pub use lifecycle::{ApplicationLifecycle, LifecycleError};
pub use store::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, InMemoryStore, JobFilter, JobRepository,
    JobVisibility, PostgresStore, Store, StoreError, UserRepository,
};
