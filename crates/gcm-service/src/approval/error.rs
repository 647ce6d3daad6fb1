//! Approval workflow errors.

use thiserror::Error;

use gcm_core::{AppError, ErrorKind};
use gcm_entity::approval::RequestStatus;

/// Why a workflow operation failed.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No record with the given id.
    #[error("Record {0} not found")]
    NotFound(String),

    /// The record already left the open state.
    #[error("Record {id} is already {status}")]
    AlreadyResolved {
        /// Record id.
        id: String,
        /// Its terminal status.
        status: RequestStatus,
    },

    /// The entity the change refers to no longer exists.
    #[error("{0} no longer exists")]
    TargetMissing(String),

    /// The proposal itself is malformed.
    #[error("{0}")]
    Validation(String),

    /// Applying the proposal would break an invariant of the catalog.
    #[error("{0}")]
    Conflict(String),

    /// The store failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] AppError),
}

impl ApprovalError {
    /// Machine-readable reason code reported to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyResolved { .. } => "already_resolved",
            Self::TargetMissing(_) => "target_missing",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl From<AppError> for ApprovalError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Validation | ErrorKind::Serialization => Self::Validation(err.message),
            ErrorKind::Conflict => Self::Conflict(err.message),
            _ => Self::Persistence(err),
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::Persistence(inner) => inner,
            ApprovalError::NotFound(_) | ApprovalError::TargetMissing(_) => {
                AppError::not_found(err.to_string())
            }
            ApprovalError::AlreadyResolved { .. } | ApprovalError::Conflict(_) => {
                AppError::conflict(err.to_string())
            }
            ApprovalError::Validation(_) => AppError::validation(err.to_string()),
        }
    }
}

/// Result alias for workflow operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_classification() {
        let e: ApprovalError = AppError::validation("bad price").into();
        assert_eq!(e.reason(), "validation");
        let e: ApprovalError = AppError::conflict("city has maps").into();
        assert_eq!(e.reason(), "conflict");
        let e: ApprovalError = AppError::service_unavailable("down").into();
        assert_eq!(e.reason(), "persistence");
        let e: ApprovalError = AppError::database("lost").into();
        assert!(matches!(e, ApprovalError::Persistence(_)));
    }

    #[test]
    fn test_into_app_error_keeps_store_error() {
        let e = ApprovalError::Persistence(AppError::service_unavailable("down"));
        assert_eq!(AppError::from(e).kind, ErrorKind::ServiceUnavailable);
        let e = ApprovalError::TargetMissing("Map x".into());
        assert_eq!(AppError::from(e).kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_already_resolved_message() {
        let e = ApprovalError::AlreadyResolved {
            id: "42".into(),
            status: RequestStatus::Closed,
        };
        assert_eq!(e.to_string(), "Record 42 is already closed");
    }
}
