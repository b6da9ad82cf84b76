//! `hireflow-auth`: credential, token and authorization boundary.
//!
//! This crate is decoupled from HTTP. Storage is reached only through the
//! [`CredentialStore`] trait, which the infra layer implements.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;
pub mod token;

pub use authorize::{AuthzError, ResourceOwner, require_ownership, require_permission, require_role};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use permissions::{Permission, PermissionParseError, PermissionSet};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use session::{AuthError, CredentialStore, CredentialStoreError, SessionService, StoredCredential};
pub use token::{Hs256Jwt, JwtValidator, SignedToken, TokenSigningError};
