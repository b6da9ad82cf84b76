//! Data-access boundary.
//!
//! Repository traits plus two implementations: [`InMemoryStore`] for tests and
//! local development, and [`PostgresStore`] for deployments. Services receive
//! the store explicitly (`Arc<dyn Store>`); there is no process-wide client.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{
    ApplicationFilter, ApplicationRepository, CompanyRepository, JobFilter, JobRepository, JobVisibility, Store,
    StoreError, UserRepository,
};
