//! HS256 session token codec.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::Serialize;
use thiserror::Error;

use hireflow_core::UserId;

use crate::{SessionClaims, TokenValidationError, validate_claims};

/// Decodes and validates bearer tokens.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError>;
}

/// A freshly issued token plus its expiry (returned to clients on login).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("failed to sign session token: {0}")]
pub struct TokenSigningError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies HS256-signed session tokens against a single secret.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256Jwt {
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // Time-window checks run in `validate_claims` against an injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Sign a token for `subject`, valid from `now` for the configured TTL.
    pub fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<SignedToken, TokenSigningError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims::new(subject, now, expires_at);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(SignedToken { token, expires_at })
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenValidationError::InvalidSignature,
                _ => TokenValidationError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> Hs256Jwt {
        Hs256Jwt::new(secret.as_bytes(), Duration::hours(Hs256Jwt::DEFAULT_TTL_HOURS))
    }

    #[test]
    fn issued_token_validates_to_same_subject() {
        let jwt = codec("test-secret");
        let now = Utc::now();
        let subject = UserId::new();

        let signed = jwt.issue(subject, now).unwrap();
        let claims = jwt.validate(&signed.token, now).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(signed.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let signed = codec("secret-a").issue(UserId::new(), now).unwrap();

        assert_eq!(
            codec("secret-b").validate(&signed.token, now),
            Err(TokenValidationError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let jwt = codec("test-secret");
        let now = Utc::now();
        let signed = jwt.issue(UserId::new(), now).unwrap();
        let other = jwt.issue(UserId::new(), now).unwrap();

        // Splice another token's payload under the first signature.
        let a: Vec<&str> = signed.token.split('.').collect();
        let b: Vec<&str> = other.token.split('.').collect();
        let forged = format!("{}.{}.{}", a[0], b[1], a[2]);

        assert_eq!(jwt.validate(&forged, now), Err(TokenValidationError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = codec("test-secret");
        let issued = Utc::now() - Duration::hours(25);
        let signed = jwt.issue(UserId::new(), issued).unwrap();

        assert_eq!(
            jwt.validate(&signed.token, Utc::now()),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            codec("test-secret").validate("not.a.jwt", Utc::now()),
            Err(TokenValidationError::Malformed(_))
        ));
    }
}
