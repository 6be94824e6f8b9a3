//! # Error Types
//!
//! Domain-specific error types for niaga-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  niaga-core errors (this file)                                         │
//! │  ├── CoreError              - umbrella for every domain failure        │
//! │  ├── ValidationError        - malformed / out-of-range input           │
//! │  ├── LinkResolutionError    - reference not found (non-blocking)       │
//! │  └── IllegalTransitionError - status change not defined                │
//! │                                                                         │
//! │  niaga-engine errors (separate crate)                                  │
//! │  └── EngineError            - config, repository, I/O                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## User-Visible Behavior
//! | Kind                 | UI reaction                                   |
//! |----------------------|-----------------------------------------------|
//! | Validation           | block, highlight the field                    |
//! | LinkResolution       | warn, save anyway, badge shows "unresolved"   |
//! | IllegalTransition    | block, inline message, nothing applied        |
//! | ConcurrencyConflict  | ask to reload, keep unsaved line edits        |

use thiserror::Error;

use crate::types::DocumentKind;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced document could not be resolved.
    #[error("Link resolution error: {0}")]
    LinkResolution(#[from] LinkResolutionError),

    /// A status change is not defined for the document type.
    #[error("Illegal transition: {0}")]
    IllegalTransition(#[from] IllegalTransitionError),

    /// The stored document changed since it was loaded.
    ///
    /// ## When This Occurs
    /// Two users edit the same Sales Order; the second save carries a stale
    /// `version`. Raised by the persistence collaborator, never by the pure
    /// calculators.
    #[error("{kind} {id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrencyConflict {
        kind: DocumentKind,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Deletion refused because other documents still link to this one.
    #[error("{kind} {number} is still referenced by {referenced_by:?}")]
    StillReferenced {
        kind: DocumentKind,
        number: String,
        referenced_by: Vec<String>,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Each variant names the offending field so the form can highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A collection that must have entries is empty (e.g. no line items).
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g. non-numeric amount, a document number with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the field to highlight.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Empty { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Link Resolution Error
// =============================================================================

/// A soft reference could not be resolved by id or by number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkResolutionError {
    /// Neither an id nor a number was supplied.
    #[error("no {kind} reference given")]
    Missing { kind: DocumentKind },

    /// Nothing matched the id or the number.
    #[error("{kind} not found (id: {id:?}, number: {number:?})")]
    Unresolved {
        kind: DocumentKind,
        id: Option<String>,
        number: Option<String>,
    },
}

// =============================================================================
// Illegal Transition Error
// =============================================================================

/// A requested status change is not defined for the document type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalTransitionError {
    /// The target is not a status of this document type at all.
    #[error("'{target}' is not a {kind} status")]
    UnknownStatus { kind: DocumentKind, target: String },

    /// The target exists but is not offered from the current status.
    #[error("{kind} cannot move from {from} to {to}")]
    NotAllowed {
        kind: DocumentKind,
        from: String,
        to: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
