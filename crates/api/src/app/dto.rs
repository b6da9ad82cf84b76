use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, async_trait};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hireflow_auth::{Principal, SignedToken};

use crate::app::errors::ApiError;

// -------------------------
// Envelope
// -------------------------

/// Success envelope: `{success: true, data?, message?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data, None)
}

pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    respond(StatusCode::CREATED, data, Some(message.to_string()))
}

pub fn ok_with_message<T: Serialize>(data: T, message: &str) -> Response {
    respond(StatusCode::OK, data, Some(message.to_string()))
}

fn respond<T: Serialize>(status: StatusCode, data: T, message: Option<String>) -> Response {
    (
        status,
        Json(Envelope {
            success: true,
            data: Some(data),
            message,
        }),
    )
        .into_response()
}

/// JSON body extractor whose rejection uses the API error shape (400).
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_id: String,
    /// Required when an admin applies on behalf of a candidate.
    pub candidate_id: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationListQuery {
    pub job_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// `desc` (default, newest first) or `asc` (creation order).
    pub order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Required for admins; hr users post for their own company.
    pub company_id: Option<String>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub company_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    pub company_id: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub email_verified: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Principal,
}

impl LoginResponse {
    pub fn new(token: SignedToken, user: Principal) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}
