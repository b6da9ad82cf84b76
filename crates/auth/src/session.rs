//! Credential & token service: login, token issuance, per-request principal resolution.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use hireflow_core::{CompanyId, UserId};

use crate::{
    Hs256Jwt, JwtValidator, PasswordError, PasswordHasher, PermissionSet, Principal, Role,
    SignedToken, TokenSigningError, TokenValidationError,
};

const DECOY_PASSWORD: &str = "hireflow-decoy-password";

/// Authentication-relevant projection of a persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Capability mapping exactly as persisted (JSON text), if any.
    pub permissions: Option<String>,
    pub company_id: Option<CompanyId>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl StoredCredential {
    /// Project into a request principal.
    ///
    /// A permission mapping that does not parse yields an empty set; the
    /// request still proceeds with role-based access only.
    pub fn into_principal(self) -> Principal {
        let permissions = match self.permissions.as_deref() {
            None => PermissionSet::new(),
            Some(raw) => PermissionSet::parse_stored(raw).unwrap_or_else(|e| {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "stored permissions failed to parse; continuing with none"
                );
                PermissionSet::new()
            }),
        };

        Principal {
            id: self.user_id,
            email: self.email,
            role: self.role,
            permissions,
            company_id: self.company_id,
            is_active: self.is_active,
            email_verified: self.email_verified,
        }
    }
}

#[derive(Debug, Error)]
#[error("credential store failure: {0}")]
pub struct CredentialStoreError(pub String);

/// Storage seam for credential lookups (implemented by the infra layer).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact (case-sensitive) email match.
    async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>, CredentialStoreError>;

    async fn credential_by_id(&self, user_id: UserId) -> Result<Option<StoredCredential>, CredentialStoreError>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(TokenValidationError),

    #[error("token has expired")]
    ExpiredToken,

    #[error("unknown or inactive subject")]
    UnknownOrInactiveSubject,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Signing(#[from] TokenSigningError),

    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

impl AuthError {
    /// True for failures caused by the caller's credentials (401), false for
    /// infrastructure failures.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken(_)
                | AuthError::ExpiredToken
                | AuthError::UnknownOrInactiveSubject
        )
    }
}

impl From<TokenValidationError> for AuthError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => AuthError::ExpiredToken,
            other => AuthError::InvalidToken(other),
        }
    }
}

/// Verifies passwords, issues tokens and resolves principals.
///
/// The subject is looked up on every resolution, so deactivating a user
/// revokes all of their outstanding tokens immediately.
pub struct SessionService<C: ?Sized> {
    store: Arc<C>,
    jwt: Arc<Hs256Jwt>,
    hasher: PasswordHasher,
    /// Hash at the configured cost, verified against when no usable account
    /// matches so every failed login pays the same bcrypt work.
    decoy_hash: Arc<str>,
}

impl<C: ?Sized> Clone for SessionService<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            jwt: self.jwt.clone(),
            hasher: self.hasher,
            decoy_hash: self.decoy_hash.clone(),
        }
    }
}

impl<C> SessionService<C>
where
    C: CredentialStore + ?Sized,
{
    pub async fn new(store: Arc<C>, jwt: Arc<Hs256Jwt>, hasher: PasswordHasher) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD).await?.into();
        Ok(Self {
            store,
            jwt,
            hasher,
            decoy_hash,
        })
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let credential = self
            .store
            .credential_by_email(email)
            .await?
            .filter(|c| c.is_active);
        let Some(credential) = credential else {
            self.hasher.verify(password, &self.decoy_hash).await?;
            return Err(AuthError::InvalidCredentials);
        };
        if !self.hasher.verify(password, &credential.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(credential.into_principal())
    }

    pub fn issue_token(&self, subject: UserId) -> Result<SignedToken, AuthError> {
        self.issue_token_at(subject, Utc::now())
    }

    pub fn issue_token_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<SignedToken, AuthError> {
        Ok(self.jwt.issue(subject, now)?)
    }

    pub async fn resolve_principal(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        self.resolve_principal_at(token, Utc::now()).await
    }

    pub async fn resolve_principal_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.jwt.validate(token, now)?;

        match self.store.credential_by_id(claims.sub).await? {
            Some(credential) if credential.is_active => Ok(credential.into_principal()),
            _ => Err(AuthError::UnknownOrInactiveSubject),
        }
    }

    /// Like [`Self::resolve_principal`], but authentication failures yield `None`.
    ///
    /// Storage failures still propagate.
    pub async fn optional_resolve_principal(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Principal>, CredentialStoreError> {
        match self.resolve_principal(token).await {
            Ok(principal) => Ok(Some(principal)),
            Err(AuthError::Store(e)) => Err(e),
            Err(e) => {
                if token.is_some() {
                    tracing::debug!(error = %e, "ignoring unusable token on optional-auth route");
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use chrono::Duration;

    use super::*;
    use crate::permissions::catalog;

    #[derive(Default)]
    struct FakeCredentials {
        users: RwLock<HashMap<UserId, StoredCredential>>,
    }

    impl FakeCredentials {
        fn put(&self, credential: StoredCredential) {
            self.users.write().unwrap().insert(credential.user_id, credential);
        }

        fn set_active(&self, user_id: UserId, active: bool) {
            if let Some(c) = self.users.write().unwrap().get_mut(&user_id) {
                c.is_active = active;
            }
        }
    }

    #[async_trait]
    impl CredentialStore for FakeCredentials {
        async fn credential_by_email(&self, email: &str) -> Result<Option<StoredCredential>, CredentialStoreError> {
            Ok(self.users.read().unwrap().values().find(|c| c.email == email).cloned())
        }

        async fn credential_by_id(&self, user_id: UserId) -> Result<Option<StoredCredential>, CredentialStoreError> {
            Ok(self.users.read().unwrap().get(&user_id).cloned())
        }
    }

    async fn setup() -> (Arc<FakeCredentials>, SessionService<FakeCredentials>, UserId) {
        let store = Arc::new(FakeCredentials::default());
        let hasher = PasswordHasher::new(4).unwrap();
        let jwt = Arc::new(Hs256Jwt::new(b"test-secret", Duration::hours(24)));
        let sessions = SessionService::new(store.clone(), jwt, hasher).await.unwrap();

        let user_id = UserId::new();
        store.put(StoredCredential {
            user_id,
            email: "dana@example.com".to_string(),
            password_hash: hasher.hash("s3cret-pass").await.unwrap(),
            role: Role::Hr,
            permissions: Some(r#"{"jobs.create": true}"#.to_string()),
            company_id: Some(CompanyId::new()),
            is_active: true,
            email_verified: true,
        });
        (store, sessions, user_id)
    }

    #[tokio::test]
    async fn login_then_token_resolves_to_same_principal() {
        let (_store, sessions, user_id) = setup().await;

        let principal = sessions.verify_credentials("dana@example.com", "s3cret-pass").await.unwrap();
        assert_eq!(principal.id, user_id);

        let token = sessions.issue_token(principal.id).unwrap();
        let resolved = sessions.resolve_principal(Some(&token.token)).await.unwrap();
        assert_eq!(resolved.id, user_id);
        assert_eq!(resolved.role, Role::Hr);
        assert!(resolved.permissions.contains(&catalog::JOBS_CREATE));
    }

    #[tokio::test]
    async fn wrong_password_unknown_email_and_case_mismatch_fail() {
        let (_store, sessions, _) = setup().await;

        for (email, password) in [
            ("dana@example.com", "nope"),
            ("nobody@example.com", "s3cret-pass"),
            ("Dana@example.com", "s3cret-pass"),
        ] {
            assert!(matches!(
                sessions.verify_credentials(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        let (store, sessions, user_id) = setup().await;
        store.set_active(user_id, false);

        assert!(matches!(
            sessions.verify_credentials("dana@example.com", "s3cret-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn failed_logins_cost_the_same_bcrypt_work_whether_or_not_the_account_exists() {
        let store = Arc::new(FakeCredentials::default());
        let hasher = PasswordHasher::new(10).unwrap();
        let jwt = Arc::new(Hs256Jwt::new(b"test-secret", Duration::hours(24)));
        let sessions = SessionService::new(store.clone(), jwt, hasher).await.unwrap();
        assert!(sessions.decoy_hash.starts_with("$2b$10$"));

        let inactive_id = UserId::new();
        for (user_id, email, is_active) in [
            (UserId::new(), "known@example.com", true),
            (inactive_id, "inactive@example.com", false),
        ] {
            store.put(StoredCredential {
                user_id,
                email: email.to_string(),
                password_hash: hasher.hash("real-password").await.unwrap(),
                role: Role::Candidate,
                permissions: None,
                company_id: None,
                is_active,
                email_verified: true,
            });
        }

        async fn time_failures(sessions: &SessionService<FakeCredentials>, email: &str) -> std::time::Duration {
            let started = std::time::Instant::now();
            for _ in 0..3 {
                assert!(matches!(
                    sessions.verify_credentials(email, "wrong-password").await,
                    Err(AuthError::InvalidCredentials)
                ));
            }
            started.elapsed()
        }

        let known = time_failures(&sessions, "known@example.com").await;
        let unknown = time_failures(&sessions, "nobody@example.com").await;
        let inactive = time_failures(&sessions, "inactive@example.com").await;

        assert!(unknown * 4 >= known, "unknown email: {unknown:?}, known email: {known:?}");
        assert!(inactive * 4 >= known, "inactive user: {inactive:?}, known email: {known:?}");
    }

    #[tokio::test]
    async fn expired_token_fails_expired() {
        let (_store, sessions, user_id) = setup().await;
        let token = sessions.issue_token_at(user_id, Utc::now() - Duration::hours(30)).unwrap();

        assert!(matches!(
            sessions.resolve_principal(Some(&token.token)).await,
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn deactivation_revokes_previously_issued_tokens() {
        let (store, sessions, user_id) = setup().await;
        let token = sessions.issue_token(user_id).unwrap();
        assert!(sessions.resolve_principal(Some(&token.token)).await.is_ok());

        store.set_active(user_id, false);
        for _ in 0..2 {
            assert!(matches!(
                sessions.resolve_principal(Some(&token.token)).await,
                Err(AuthError::UnknownOrInactiveSubject)
            ));
        }
    }

    #[tokio::test]
    async fn unknown_subject_and_missing_token() {
        let (_store, sessions, _) = setup().await;
        let token = sessions.issue_token(UserId::new()).unwrap();

        assert!(matches!(
            sessions.resolve_principal(Some(&token.token)).await,
            Err(AuthError::UnknownOrInactiveSubject)
        ));
        assert!(matches!(sessions.resolve_principal(None).await, Err(AuthError::MissingToken)));
        assert!(matches!(
            sessions.resolve_principal(Some("garbage")).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn malformed_permissions_degrade_to_empty_set() {
        let (store, sessions, user_id) = setup().await;
        let mut credential = store.credential_by_id(user_id).await.unwrap().unwrap();
        credential.permissions = Some("{broken".to_string());
        store.put(credential);

        let token = sessions.issue_token(user_id).unwrap();
        let principal = sessions.resolve_principal(Some(&token.token)).await.unwrap();
        assert!(principal.permissions.is_empty());
    }

    #[tokio::test]
    async fn optional_resolution_swallows_auth_failures() {
        let (_store, sessions, user_id) = setup().await;
        let token = sessions.issue_token(user_id).unwrap();

        assert!(sessions.optional_resolve_principal(None).await.unwrap().is_none());
        assert!(sessions.optional_resolve_principal(Some("bad")).await.unwrap().is_none());
        let principal = sessions.optional_resolve_principal(Some(&token.token)).await.unwrap();
        assert_eq!(principal.map(|p| p.id), Some(user_id));
    }
}
