use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response;
use crate::service::ServiceError;

/// HTTP-facing error. Every failure leaving a handler becomes one of
/// these, and the variant alone decides the status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal detail is logged, never sent to the client.
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        response::envelope::<()>(status, &message, None, None)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Validation(_) => ApiError::BadRequest(err.to_string()),
            // Both map to 404, but each keeps its own label so a malformed
            // id and a missing task stay distinguishable on the wire.
            ServiceError::InvalidId(_) | ServiceError::NotFound => {
                ApiError::NotFound(err.to_string())
            }
            ServiceError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}
