//! Unified error types for store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Every variant maps to exactly one HTTP status; the mapping lives in
/// `handlers::problem_details` so stores stay transport-agnostic.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller-supplied identifier is malformed for this entity.
    ///
    /// Distinct from `NotFound`: a well-formed id that matches nothing is
    /// absent, a malformed one is a caller error.
    #[error("invalid {entity} id: {id}")]
    InvalidIdentifier { entity: &'static str, id: String },

    /// No record matched the identifier.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The record exists but belongs to another user.
    #[error("{entity} {id} belongs to another user")]
    Forbidden { entity: &'static str, id: String },

    /// The operation violates a domain rule (negative duration, negative
    /// counter, empty required field).
    #[error("{0}")]
    Validation(String),

    /// I/O error talking to the backing store.
    #[error("store unavailable: I/O error at {path}: {source}")]
    BackendIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be decoded.
    #[error("store unavailable: bad document in {context}: {message}")]
    BackendData { context: String, message: String },
}

impl StoreError {
    /// Create an invalid-identifier error.
    pub fn invalid_identifier(entity: &'static str, id: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            entity,
            id: id.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a forbidden error.
    pub fn forbidden(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Forbidden {
            entity,
            id: id.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a backend I/O error with path context.
    pub fn backend_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BackendIo {
            path: path.into(),
            source,
        }
    }

    /// Create a backend decode error with collection/path context.
    pub fn backend_data(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendData {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Machine-stable reason, carried in error responses separately from
    /// the free-text detail.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Validation(_) => "validation_failed",
            Self::BackendIo { .. } | Self::BackendData { .. } => "store_unavailable",
        }
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
