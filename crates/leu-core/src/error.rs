//! # Error Types
//!
//! Domain-specific error types for leu-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  leu-core errors (this file)                                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  leu-db errors (separate crate)                                        │
//! │  └── DbError          - Document store failures                        │
//! │                                                                         │
//! │  leu-services errors                                                   │
//! │  └── LoyaltyError     - What the views see (NotFound, Storage, ...)    │
//! │                                                                         │
//! │  Flow: ValidationError ──────────► LoyaltyError::Validation → View     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., email without '@').
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
