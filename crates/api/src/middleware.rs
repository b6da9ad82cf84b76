use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use hireflow_auth::SessionService;
use hireflow_infra::{Environment, Store};

use crate::app::errors::{ApiError, InternalErrorDetail, json_error};
use crate::context::{OptionalPrincipal, PrincipalContext};

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionService<dyn Store>,
}

/// Wrap each request in a span carrying method, path and (once known) the
/// principal id, and log its completion.
pub async fn request_span(req: Request<Body>, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        principal_id = tracing::field::Empty,
    );
    let started = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        tracing::info!(status = response.status().as_u16(), elapsed_ms, "request completed");
    });
    response
}

/// Required authentication: resolves the bearer token to a principal or
/// rejects the request with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?.map(str::to_owned);
    let principal = state.sessions.resolve_principal(token.as_deref()).await?;

    tracing::Span::current().record("principal_id", tracing::field::display(principal.id));
    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

/// Optional authentication: unusable tokens are treated as anonymous.
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok().flatten().map(str::to_owned);
    let principal = state.sessions.optional_resolve_principal(token.as_deref()).await?;

    if let Some(principal) = &principal {
        tracing::Span::current().record("principal_id", tracing::field::display(principal.id));
    }
    req.extensions_mut().insert(OptionalPrincipal::new(principal));

    Ok(next.run(req).await)
}

/// Outside production, replace the generic 500 body with the underlying error.
pub async fn internal_error_detail(
    State(environment): State<Environment>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    if environment.is_production() {
        return response;
    }
    match response.extensions_mut().remove::<InternalErrorDetail>() {
        Some(InternalErrorDetail(detail)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
        }
        None => response,
    }
}

/// `Ok(None)` when no Authorization header is present; an error when one is
/// present but is not a usable bearer credential.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || ApiError::Unauthenticated("malformed authorization header".to_string());
    let header = header.to_str().map_err(|_| malformed())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(malformed)?.trim();
    if token.is_empty() {
        return Err(malformed());
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap(), None);
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).unwrap(), Some("abc.def"));
        assert!(extract_bearer(&headers("Basic dXNlcg==")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
