//! Convenience result type alias for the GCM server.

use crate::error::AppError;

/// A specialized `Result` type for GCM operations.
pub type AppResult<T> = Result<T, AppError>;
