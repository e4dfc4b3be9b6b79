//! API errors with their stable code set.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use ghostflow_executor::ExecutorError;
use ghostflow_protocols::StoreError;

use crate::envelope::Envelope;

/// Every failure a handler can surface, carrying its stable wire code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Batch exceeds the maximum of {max} events")]
    BatchTooLarge { max: usize },

    #[error("Rate limit exceeded for device {0}")]
    RateLimitExceeded(String),

    #[error("Missing orgId")]
    MissingOrg,

    #[error("Missing ghostId")]
    MissingGhost,

    #[error("Ghost not found")]
    GhostNotFound,

    #[error("Ghost is not approved for execution")]
    GhostNotApproved,

    #[error("Failed to persist events: {0}")]
    InsertFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionError(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable wire code consumed by dashboards.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidBatch(_) => "INVALID_BATCH",
            ApiError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            ApiError::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            ApiError::MissingOrg => "MISSING_ORG",
            ApiError::MissingGhost => "MISSING_GHOST",
            ApiError::GhostNotFound => "GHOST_NOT_FOUND",
            ApiError::GhostNotApproved => "GHOST_NOT_APPROVED",
            ApiError::InsertFailed(_) => "INSERT_FAILED",
            ApiError::ExecutionError(_) => "EXECUTION_ERROR",
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBatch(_)
            | ApiError::BatchTooLarge { .. }
            | ApiError::MissingOrg
            | ApiError::MissingGhost => StatusCode::BAD_REQUEST,
            ApiError::GhostNotApproved => StatusCode::FORBIDDEN,
            ApiError::GhostNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InsertFailed(_)
            | ApiError::ExecutionError(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // No sensitive detail leaves in the body; the display string is the
        // curated message.
        let envelope = Envelope::err(self.code(), self.to_string());
        let mut response = (self.status(), Json(envelope)).into_response();
        if matches!(self, ApiError::RateLimitExceeded(_)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from_static("60"));
        }
        response
    }
}

impl From<ExecutorError> for ApiError {
    fn from(error: ExecutorError) -> Self {
        match error {
            ExecutorError::GhostNotFound(_) => ApiError::GhostNotFound,
            ExecutorError::GhostNotApproved(_) => ApiError::GhostNotApproved,
            ExecutorError::Store(error) => ApiError::ExecutionError(error.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => ApiError::GhostNotFound,
            StoreError::MissingOrgScope => ApiError::MissingOrg,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
