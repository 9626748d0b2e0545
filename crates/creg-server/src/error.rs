use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use creg_engine::{EngineError, IssueError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors starting or configuring the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable tag, e.g. `"duplicate"`.
    pub error: String,
    pub message: String,
}

/// A request-level failure, rendered as an [`ErrorBody`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {actual} bytes (limit {limit})")]
    PayloadTooLarge { actual: usize, limit: usize },

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_tag(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            Self::Issue(err) => match err {
                IssueError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                IssueError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
                IssueError::Store(_) => (StatusCode::BAD_GATEWAY, "blob_store"),
                IssueError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ledger"),
                IssueError::IndexAppend { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "index_append")
                }
            },
            Self::Engine(err) => match err {
                EngineError::ConsistencyViolation { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "consistency_violation")
                }
                EngineError::UnknownCertificate(_) => (StatusCode::NOT_FOUND, "not_found"),
                EngineError::Blob(_) => (StatusCode::BAD_GATEWAY, "blob_store"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, tag) = self.status_and_tag();
        if status.is_server_error() {
            tracing::error!(error = %self, tag, "request failed");
        } else {
            tracing::debug!(error = %self, tag, "request rejected");
        }
        let body = ErrorBody {
            error: tag.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creg_engine::CertificateId;

    #[test]
    fn duplicate_is_conflict() {
        let id = CertificateId::from_hash([1; 32]);
        let (status, tag) = ApiError::from(IssueError::Duplicate(id)).status_and_tag();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(tag, "duplicate");
    }

    #[test]
    fn consistency_violation_has_its_own_tag() {
        let err = ApiError::from(EngineError::ConsistencyViolation {
            student_id: "ST1".into(),
            id: CertificateId::from_hash([2; 32]),
        });
        let (status, tag) = err.status_and_tag();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(tag, "consistency_violation");
    }

    #[test]
    fn unknown_certificate_is_404() {
        let err = ApiError::from(EngineError::UnknownCertificate(CertificateId::from_hash(
            [3; 32],
        )));
        assert_eq!(err.status_and_tag().0, StatusCode::NOT_FOUND);
    }
}
