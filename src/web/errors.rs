//! # Web API Error Types
//!
//! HTTP mapping of the engine's error taxonomy. Every failure leaves the
//! server as the same envelope the success paths use:
//! `{ "success": false, "message": "..." }`.

use crate::error::{ErrorKind, FlowError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Web API errors with HTTP status code mappings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Authentication required: {reason}")]
    Unauthorized { reason: String },

    #[error("{reason}")]
    Forbidden { reason: String },

    /// Message is already safe for clients
    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        let message = err.public_message();
        match err.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => Self::BadRequest { message },
            ErrorKind::NotFound => Self::NotFound { message },
            ErrorKind::Persistence => Self::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "message": self.to_string(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SignerRole;
    use uuid::Uuid;

    #[test]
    fn test_flow_error_status_mapping() {
        let cases = [
            (FlowError::validation("empty"), StatusCode::BAD_REQUEST),
            (FlowError::AlreadySigned, StatusCode::BAD_REQUEST),
            (
                FlowError::RoleMismatch {
                    required: SignerRole::Admin,
                },
                StatusCode::BAD_REQUEST,
            ),
            (FlowError::FlowAlreadyComplete, StatusCode::BAD_REQUEST),
            (FlowError::NoFlowDefined, StatusCode::NOT_FOUND),
            (
                FlowError::DocumentNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                FlowError::persistence("record signature", "deadlock detected"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_persistence_cause_is_hidden() {
        let api_error = ApiError::from(FlowError::persistence(
            "record signature",
            "connection reset by peer",
        ));
        assert_eq!(api_error.to_string(), "Failed to record signature");
    }
}
