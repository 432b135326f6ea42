//! Convenience result type alias.

use crate::error::AppError;

/// A specialized `Result` type for folder core operations.
///
/// Every crate in the workspace returns `AppResult<T>` so that errors
/// propagate through `?` without per-crate conversions.
pub type AppResult<T> = Result<T, AppError>;
