//! Recruiting domain module: accounts, companies, job postings and applications.
//!
//! This crate contains business rules implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage). Every decision returns the new
//! state for the infra layer to persist.

pub mod account;
pub mod application;
pub mod company;
pub mod job;
mod validate;

pub use account::{RegisterAccount, UserAccount};
pub use application::{
    Application, ApplicationDetails, ApplicationStatus, ChangeStatus, StatusChange, StatusHistoryEntry,
    SubmitApplication, Submission, SUBMITTED_NOTE,
};
pub use company::{Company, RegisterCompany};
pub use job::{Job, JobStatus, PostJob};
