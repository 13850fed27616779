//! Rejection responses.
//!
//! Every gate outcome maps to a distinct status and a JSON body of the form
//! `{"error": <code>, "detail": <message>}` so operators can tell deployment
//! defects (503) from rejected callers (401/429).

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::GateError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::AuthMisconfigured | GateError::RateLimitMisconfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GateError::Unauthorized => StatusCode::UNAUTHORIZED,
            GateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            GateError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let body = ErrorBody {
            error: self.code(),
            detail: self.to_string(),
            retry_after,
        };

        let mut response = (self.status(), Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
