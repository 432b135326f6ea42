//! Unified application error types.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the `?` operator. Precondition failures of folder
//! operations (validation, locks, non-empty folders, broken parents) carry
//! their own [`ErrorKind`] so callers can display them without parsing
//! messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// Input validation failed (empty or invalid title, duplicate sibling, cycle).
    Validation,
    /// The folder, or one of its ancestors, is locked.
    Locked,
    /// The folder still has active content.
    NotEmpty,
    /// The parent folder of a restore target is missing or deleted.
    InvalidParent,
    /// A conflict occurred (concurrent modification).
    Conflict,
    /// An internal error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A cache error occurred.
    Cache,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Locked => write!(f, "LOCKED"),
            Self::NotEmpty => write!(f, "NOT_EMPTY"),
            Self::InvalidParent => write!(f, "INVALID_PARENT"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error.
///
/// Validation failures may carry several messages in [`AppError::details`];
/// `message` then holds them joined for display.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Individual messages collected by a validation pass.
    pub details: Vec<String>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a validation error with a single message.
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::Validation,
            details: vec![message.clone()],
            message,
            source: None,
        }
    }

    /// Create a validation error from every message of a validation pass.
    pub fn validation_errors(details: Vec<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: details.join("; "),
            details,
            source: None,
        }
    }

    /// Create a locked error.
    pub fn locked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Locked, message)
    }

    /// Create a not-empty error.
    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotEmpty, message)
    }

    /// Create an invalid-parent error.
    pub fn invalid_parent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParent, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether this error is a precondition failure meant for display
    /// rather than a fault of the underlying infrastructure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Validation
                | ErrorKind::Locked
                | ErrorKind::NotEmpty
                | ErrorKind::InvalidParent
                | ErrorKind::NotFound
                | ErrorKind::Authorization
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
