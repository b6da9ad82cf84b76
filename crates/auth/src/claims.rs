use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hireflow_core::UserId;

/// Session token claims.
///
/// Only the subject and the validity window are embedded. Role and
/// permissions are re-resolved from storage on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id).
    pub sub: UserId,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this, in [`crate::Hs256Jwt`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims_at(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims::new(UserId::new(), now, now + Duration::hours(1))
    }

    #[test]
    fn accepts_inside_window() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims_at(now), now), Ok(()));
    }

    #[test]
    fn rejects_at_and_after_expiry() {
        let now = Utc::now();
        let claims = claims_at(now);
        assert_eq!(
            validate_claims(&claims, now + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, now + Duration::days(3)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn rejects_future_and_inverted_windows() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims_at(now + Duration::minutes(5)), now),
            Err(TokenValidationError::NotYetValid)
        );

        let inverted = SessionClaims::new(UserId::new(), now, now - Duration::seconds(1));
        assert_eq!(validate_claims(&inverted, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
