//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps them to status
//! codes and response envelopes; nothing in the domain knows about HTTP.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ports::StorageError;

/// Stable machine-readable error code describing the failure category.
///
/// The set is closed: adapters match on it exhaustively, so adding a variant
/// forces every mapping to be revisited at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Input is well formed but violates a business or field rule.
    ValidationError,
    /// A referenced aggregate does not exist (or is soft deleted).
    NotFound,
    /// The operation would break a uniqueness or state constraint.
    Conflict,
    /// The request could not be understood at all (e.g. malformed JSON).
    BadRequest,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad_request",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-rule violation raised by an application service.
///
/// ## Invariants
/// - Immutable once raised: there are no setters, only builder-style
///   constructors consumed before the error is returned.
/// - `details`, when present, is a JSON object naming the offending fields.
///
/// # Examples
/// ```
/// use backend::domain::{DomainError, ErrorCode};
/// use serde_json::json;
///
/// let err = DomainError::not_found("Post not found.").with_detail("id", 999);
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.details().and_then(|d| d.get("id")), Some(&json!(999)));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    details: Option<Map<String, Value>>,
}

impl DomainError {
    /// Create an error with the given code and message and no details.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Convenience constructor for [`ErrorCode::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Attach one structured detail entry, creating the map on first use.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to clients.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Structured details, if any were attached.
    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }
}

/// Failure surfaced by an application service.
///
/// `Domain` errors are recoverable by the caller and are rendered as error
/// envelopes. `Storage` errors are infrastructure failures: they are never
/// converted into envelopes and only trigger rollback and close.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Business-rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Storage or unit-of-work failure outside the domain taxonomy.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Return the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Storage(_) => None,
        }
    }
}
