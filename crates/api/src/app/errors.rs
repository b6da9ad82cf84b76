//! One boundary mapping every failure kind to an HTTP response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use hireflow_auth::{AuthError, AuthzError, CredentialStoreError, PasswordError};
use hireflow_core::{DomainError, FieldViolation};
use hireflow_infra::{LifecycleError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },

    #[error("{0}")]
    Internal(String),
}

/// The real cause of a 500, attached to the response for
/// [`crate::middleware::internal_error_detail`].
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation { .. } => "validation_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
            let mut response = json_error(status, code, "internal server error");
            response.extensions_mut().insert(InternalErrorDetail(self.to_string()));
            return response;
        }

        tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        match self {
            ApiError::Validation { message, details } if !details.is_empty() => (
                status,
                Json(json!({
                    "error": code,
                    "message": message,
                    "details": details,
                })),
            )
                .into_response(),
            other => json_error(status, code, other.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::validation(msg),
            DomainError::InvalidFields(details) => ApiError::Validation {
                message: "request validation failed".to_string(),
                details,
            },
            DomainError::NotFound(resource) => ApiError::NotFound(resource),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        if value.is_authentication_failure() {
            ApiError::Unauthenticated(value.to_string())
        } else {
            ApiError::Internal(value.to_string())
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::NotFound => ApiError::NotFound("resource"),
            other => ApiError::Forbidden(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) | StoreError::Concurrency(msg) => ApiError::Conflict(msg),
            StoreError::MissingReference(_) => ApiError::NotFound("referenced record"),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::NotFound(resource) => ApiError::NotFound(resource),
            LifecycleError::Conflict(msg) => ApiError::Conflict(msg),
            LifecycleError::Validation(e) => e.into(),
            LifecycleError::Store(e) => e.into(),
        }
    }
}

impl From<CredentialStoreError> for ApiError {
    fn from(value: CredentialStoreError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(value: PasswordError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use hireflow_auth::{Role, TokenValidationError};
    use serde_json::Value as JsonValue;

    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (AuthError::ExpiredToken.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::InvalidToken(TokenValidationError::InvalidSignature).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AuthError::Store(CredentialStoreError("down".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthzError::RoleNotAllowed {
                    role: Role::Candidate,
                    required: "hr".into(),
                }
                .into(),
                StatusCode::FORBIDDEN,
            ),
            (AuthzError::NotFound.into(), StatusCode::NOT_FOUND),
            (LifecycleError::Conflict("dup".into()).into(), StatusCode::CONFLICT),
            (DomainError::validation("bad").into(), StatusCode::BAD_REQUEST),
            (StoreError::Concurrency("stale".into()).into(), StatusCode::CONFLICT),
            (StoreError::Unavailable("pool".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn server_errors_hide_the_cause_in_the_body() {
        let response = ApiError::Internal("connection refused to 10.0.0.5".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<InternalErrorDetail>().is_some());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: JsonValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn field_violations_are_listed_as_details() {
        let err: ApiError = DomainError::InvalidFields(vec![FieldViolation::new(
            "title",
            "must not be empty",
            JsonValue::String(String::new()),
        )])
        .into();
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX).await.unwrap();
        let body: JsonValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "title");
    }
}
