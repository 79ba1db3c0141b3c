//! # Signature Flow Errors
//!
//! Every engine operation returns [`FlowResult`]. Callers branch on
//! [`FlowError::kind`] instead of matching message strings; the HTTP layer
//! maps each kind to a status code and uses [`FlowError::public_message`] so
//! persistence internals never reach clients.

use crate::constants::SignerRole;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for the signature flow engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Malformed flow definition
    #[error("Invalid flow definition: {0}")]
    Validation(String),

    #[error("User has already signed this document")]
    AlreadySigned,

    /// The caller's role does not match the active stage
    #[error("Signatures from role '{required}' ({}) are currently required", .required.display_name())]
    RoleMismatch { required: SignerRole },

    #[error("Signature flow is already complete")]
    FlowAlreadyComplete,

    #[error("No signature flow is defined for this document")]
    NoFlowDefined,

    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    /// Transaction, commit, timeout or connectivity failure; nothing was committed
    #[error("Failed to {operation}: {cause}")]
    Persistence { operation: String, cause: String },
}

/// Coarse classification used by callers to map failures uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Persistence,
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn persistence(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Persistence {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AlreadySigned | Self::RoleMismatch { .. } | Self::FlowAlreadyComplete => {
                ErrorKind::Conflict
            }
            Self::NoFlowDefined | Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    /// Message safe to hand to clients
    pub fn public_message(&self) -> String {
        match self {
            Self::Persistence { operation, .. } => format!("Failed to {operation}"),
            other => other.to_string(),
        }
    }

    /// Re-label a persistence failure with the operation that was in flight
    pub fn during(self, operation: &str) -> Self {
        match self {
            Self::Persistence { cause, .. } => Self::Persistence {
                operation: operation.to_string(),
                cause,
            },
            other => other,
        }
    }
}

impl From<sqlx::Error> for FlowError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::persistence("acquire a database connection", err),
            other => Self::persistence("access the signature flow tables", other),
        }
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
