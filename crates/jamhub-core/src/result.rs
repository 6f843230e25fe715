//! Convenience result type alias for JamHub.

use crate::error::AppError;

/// A specialized `Result` type for JamHub operations.
pub type AppResult<T> = Result<T, AppError>;
