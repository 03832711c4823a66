//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vpipe_models::{ErrorKind, JobId, RequestError};
use vpipe_pipeline::JobFailure;

pub type ApiResult<T> = Result<T, ApiError>;

/// Upper bound on the `detail` string of an error response.
const MAX_DETAIL_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{detail}")]
    Job {
        job_id: Option<JobId>,
        kind: ErrorKind,
        detail: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::InvalidRequest,
            ApiError::Job { kind, .. } => *kind,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        status_for(self.kind())
    }
}

/// HTTP status for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidContent | ErrorKind::ProbeError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::FetchFailed | ErrorKind::UploadError => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::ToolError | ErrorKind::EmptyResult | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<JobFailure> for ApiError {
    fn from(failure: JobFailure) -> Self {
        Self::Job {
            job_id: failure.job_id.clone(),
            kind: failure.kind(),
            detail: failure.error.to_string(),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<JobId>,
    kind: ErrorKind,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        // Don't expose internal error details in production
        let detail = if kind == ErrorKind::Internal
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            truncate(&self.to_string(), MAX_DETAIL_CHARS)
        };

        let job_id = match self {
            ApiError::Job { job_id, .. } => job_id,
            _ => None,
        };

        let body = ErrorResponse {
            ok: false,
            job_id,
            kind,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_map() {
        assert_eq!(status_for(ErrorKind::InvalidRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidContent), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::FetchFailed), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::UploadError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::ToolError), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(ErrorKind::EmptyResult), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_error_is_bad_request() {
        let err: ApiError = RequestError::MissingSources.into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_detail_is_bounded() {
        assert_eq!(truncate(&"é".repeat(5000), MAX_DETAIL_CHARS).chars().count(), 2000);
    }
}
