//! HTTP error boundary and body extractors.
//!
//! Every handler returns `Result<_, ApiError>`. Provider rejections surface
//! their message; anything unexpected is logged and answered with a generic
//! 500 so internal detail never reaches the caller.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::foundation::ValidationError;
use crate::ports::{AuthProviderError, RepositoryError};

use super::middleware::rate_limit::headers;

pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Error envelope: `{"success": false, "error": ..., "message": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u32>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            retry_after_secs: None,
        }
    }
}

/// A 429 answer, from either the frequency or the quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRejection {
    pub error: &'static str,
    pub message: String,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_secs: Option<u32>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input.
    BadRequest(String),
    Unauthorized { error: &'static str, message: String },
    /// Absent, or owned by someone else.
    NotFound(&'static str),
    RateLimited(RateLimitRejection),
    /// The request outlived the server's deadline.
    Timeout,
    /// The backend refused the request; its message is passed through.
    Upstream {
        status: StatusCode,
        error: &'static str,
        message: String,
    },
    /// Logged, never shown.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            error,
            message: message.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Maps a provider error: rejections answer with `status` and the
    /// provider's message, outages become a 500.
    pub fn from_provider(status: StatusCode, error: &'static str, err: AuthProviderError) -> Self {
        match err {
            AuthProviderError::Rejected(message) => Self::Upstream {
                status,
                error,
                message,
            },
            AuthProviderError::Unavailable(detail) => Self::Internal(detail),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) => ErrorResponse::new("Validation error", message),
            Self::Unauthorized { error, message } => ErrorResponse::new(error, message),
            Self::NotFound(resource) => {
                ErrorResponse::new("Not found", format!("{} not found", resource))
            }
            Self::Timeout => {
                ErrorResponse::new("Request timeout", "The request took too long to complete")
            }
            Self::Upstream { error, message, .. } => ErrorResponse::new(error, message),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                ErrorResponse::new("Internal server error", INTERNAL_ERROR_MESSAGE)
            }
            Self::RateLimited(rejection) => return rate_limited_response(rejection),
        };
        (status, Json(body)).into_response()
    }
}

fn rate_limited_response(rejection: RateLimitRejection) -> Response {
    let mut body = ErrorResponse::new(rejection.error, rejection.message);
    body.retry_after_secs = rejection.retry_after_secs;

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(rejection.limit));
    response_headers.insert(
        headers::X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(rejection.remaining),
    );
    if let Some(secs) = rejection.retry_after_secs {
        response_headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

/// `Json<T>` whose rejection is answered in the error envelope with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// JSON body that may be omitted entirely; an empty body yields `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    ApiError::bad_request(rejection.body_text())
}
