//! `hireflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult, FieldViolation};
pub use id::{ApplicationId, CompanyId, HistoryEntryId, JobId, UserId};
pub use version::ExpectedVersion;
