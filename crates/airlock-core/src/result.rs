//! Convenience result type alias for Airlock.

use crate::error::AppError;

/// A specialized `Result` type for Airlock operations.
pub type AppResult<T> = Result<T, AppError>;
