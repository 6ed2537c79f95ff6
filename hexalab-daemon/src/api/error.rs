//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": <kind>, "detail": <message>}`
//! with a status code chosen by [`ApiError::status`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hexalab_job_queue::JobQueueError;

use super::models::ErrorBody;

/// API-level error.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or rejected submission.
    BadRequest(String),
    /// Unknown job id.
    NotFound(String),
    /// Job has not finished yet.
    NotReady(String),
    /// Job finished with a failure.
    JobFailed(String),
    /// Queue is full or closed.
    Unavailable(String),
    /// Upload exceeds the configured body limit.
    PayloadTooLarge(String),
    /// Local I/O or other server-side failure.
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotReady(_) => StatusCode::ACCEPTED,
            Self::JobFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::NotReady(_) => "not_ready",
            Self::JobFailed(_) => "job_failed",
            Self::Unavailable(_) => "unavailable",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal",
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::BadRequest(d)
            | Self::NotFound(d)
            | Self::NotReady(d)
            | Self::JobFailed(d)
            | Self::Unavailable(d)
            | Self::PayloadTooLarge(d)
            | Self::Internal(d) => d,
        }
    }
}

impl From<JobQueueError> for ApiError {
    fn from(err: JobQueueError) -> Self {
        let detail = err.to_string();
        match err {
            JobQueueError::InvalidInput(_) => Self::BadRequest(detail),
            JobQueueError::UnknownJob { .. } => Self::NotFound(detail),
            JobQueueError::JobNotReady { .. } => Self::NotReady(detail),
            JobQueueError::JobFailed { detail, .. } => Self::JobFailed(detail),
            JobQueueError::QueueFull { .. } | JobQueueError::Closed => Self::Unavailable(detail),
            JobQueueError::Config { .. } => Self::Internal(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = self.detail(), "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), detail = self.detail(), "request rejected");
        }

        let body = ErrorBody {
            error: self.kind().to_owned(),
            detail: self.detail().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexalab_core::types::JobState;

    #[test]
    fn queue_errors_map_to_status_codes() {
        let cases = [
            (JobQueueError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (
                JobQueueError::UnknownJob {
                    job_id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                JobQueueError::JobNotReady {
                    job_id: "x".into(),
                    state: JobState::Running,
                },
                StatusCode::ACCEPTED,
            ),
            (
                JobQueueError::JobFailed {
                    job_id: "x".into(),
                    detail: "boom".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                JobQueueError::QueueFull { capacity: 1 },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (JobQueueError::Closed, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn job_failed_keeps_raw_detail() {
        let err = ApiError::from(JobQueueError::JobFailed {
            job_id: "x".into(),
            detail: "syft exited with exit code 1".into(),
        });
        assert_eq!(err.detail(), "syft exited with exit code 1");
        assert_eq!(err.kind(), "job_failed");
    }
}
