//! Domain-level errors for order operations.

use orderhub_auth::BrokerError;
use orderhub_pagination::{PaginateError, PaginationError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("order not found: {id}")]
    NotFound { id: Uuid },

    #[error("invalid pagination request: {0}")]
    Pagination(#[from] PaginationError),

    #[error("repository error: {message}")]
    Repository { message: String },

    #[error("delegated token acquisition failed: {0}")]
    TokenAcquisition(#[from] BrokerError),

    /// The downstream service answered with a non-success status.
    #[error("downstream service responded with status {status}")]
    Downstream { status: u16, detail: String },

    /// The downstream service could not be reached at all.
    #[error("downstream service unreachable: {reason}")]
    DownstreamUnavailable { reason: String },
}

impl DomainError {
    #[must_use]
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    pub fn downstream(status: u16, detail: impl Into<String>) -> Self {
        Self::Downstream {
            status,
            detail: detail.into(),
        }
    }

    pub fn downstream_unavailable(reason: impl Into<String>) -> Self {
        Self::DownstreamUnavailable {
            reason: reason.into(),
        }
    }
}

impl From<PaginateError<DomainError>> for DomainError {
    fn from(err: PaginateError<DomainError>) -> Self {
        match err {
            PaginateError::Source(inner) => inner,
            PaginateError::OversizedWindow { returned, limit } => Self::Repository {
                message: format!("store returned {returned} rows for a window of {limit}"),
            },
        }
    }
}
