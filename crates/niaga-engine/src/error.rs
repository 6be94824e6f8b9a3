//! # Engine Error Types
//!
//! Error types for the service layer, and the serializable [`ApiError`]
//! the UI receives.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Error Flow in Niaga                              │
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  LinkResolution  ─┼─► CoreError ─► EngineError ─► ApiError { code,      │
//! │  IllegalTransition┤                     ▲            message, field }  │
//! │  ConcurrencyConf. ┘                     │                              │
//! │                          config / io / json / not found                │
//! │                                                                         │
//! │  UI reaction by code:                                                  │
//! │    VALIDATION_ERROR      block, highlight `field`                      │
//! │    ILLEGAL_TRANSITION    block, inline message                         │
//! │    LINK_UNRESOLVED       warn only, document still saves               │
//! │    CONCURRENCY_CONFLICT  ask to reload, keep unsaved line edits        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use niaga_core::{CoreError, DocumentKind, IllegalTransitionError, LinkResolutionError, ValidationError};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Any error raised by the core rules.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No stored document with this id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: DocumentKind, id: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Input / Output Errors
    // =========================================================================
    /// File could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Payload is not well-formed JSON.
    #[error("Malformed payload: {0}")]
    Json(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal engine error (e.g. a poisoned lock).
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

impl From<LinkResolutionError> for EngineError {
    fn from(err: LinkResolutionError) -> Self {
        EngineError::Core(err.into())
    }
}

impl From<IllegalTransitionError> for EngineError {
    fn from(err: IllegalTransitionError) -> Self {
        EngineError::Core(err.into())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl EngineError {
    /// Machine-readable code for the UI.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            EngineError::Core(CoreError::LinkResolution(_)) => ErrorCode::LinkUnresolved,
            EngineError::Core(CoreError::IllegalTransition(_)) => ErrorCode::IllegalTransition,
            EngineError::Core(CoreError::ConcurrencyConflict { .. }) => ErrorCode::ConcurrencyConflict,
            EngineError::Core(CoreError::StillReferenced { .. }) => ErrorCode::StillReferenced,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::Json(_) => ErrorCode::ValidationError,
            EngineError::InvalidConfig(_)
            | EngineError::ConfigLoadFailed(_)
            | EngineError::ConfigSaveFailed(_)
            | EngineError::Io(_)
            | EngineError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Returns true if the user's action must be stopped.
    ///
    /// Link-resolution errors only degrade a badge to "unresolved"; the
    /// document still saves.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, EngineError::Core(CoreError::LinkResolution(_)))
    }

    /// Returns true if the caller should reload and retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::ConcurrencyConflict { .. }))
    }

    /// Form field to highlight, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            EngineError::Core(CoreError::Validation(e)) => Some(e.field()),
            _ => None,
        }
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// A linked document could not be resolved (non-blocking)
    LinkUnresolved,

    /// Status change not defined for the document type (422)
    IllegalTransition,

    /// Stored document changed since it was loaded (409)
    ConcurrencyConflict,

    /// Resource not found (404)
    NotFound,

    /// Deletion refused, other documents still link here (409)
    StillReferenced,

    /// Internal error (500)
    Internal,
}

/// What the UI receives when an engine call fails.
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Validation error: lines[1].quantity must not be negative",
///   "field": "lines[1].quantity"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Field to highlight, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = err.code();
        if code == ErrorCode::Internal {
            // The detail goes to the log, not to the user
            tracing::error!(error = %err, "Internal engine error");
            return ApiError::internal("Something went wrong, please try again");
        }
        ApiError {
            code,
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
