//! # Loyalty Error Types
//!
//! Errors surfaced by the loyalty services to the views.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Loyalty Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Lookup/Store   │  │  Pass Service   │  │     Input               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotFound       │  │  PassGeneration │  │  Validation             │ │
//! │  │  Storage        │  │  Notification   │  │  DuplicateScan          │ │
//! │  │  (abort op)     │  │  (soft)         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Configuration: InvalidConfig, ConfigLoadFailed, ConfigSaveFailed│   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Notification` error never undoes a visit; it rides along on the
//! [`VisitReceipt`](crate::visits::VisitReceipt) instead of failing the call.

use leu_core::ValidationError;
use leu_db::DbError;
use thiserror::Error;

/// Result type alias for loyalty operations.
pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

/// Loyalty service error.
#[derive(Debug, Clone, Error)]
pub enum LoyaltyError {
    // =========================================================================
    // Lookup / Store
    // =========================================================================
    /// The customer id is not in the store.
    #[error("Customer not found: {0}")]
    NotFound(String),

    /// The document store failed or returned an unreadable document.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Pass Service
    // =========================================================================
    /// Pass generation failed or returned no usable URL.
    #[error("Pass generation failed: {0}")]
    PassGeneration(String),

    /// The pass update notification did not go through.
    #[error("Pass update notification failed for {customer_id}: {reason}")]
    Notification { customer_id: String, reason: String },

    // =========================================================================
    // Input
    // =========================================================================
    /// Registration form or scan code rejected.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Same code scanned again inside the cooldown window.
    #[error("Code {code} was scanned moments ago")]
    DuplicateScan { code: String },

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for LoyaltyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { id, .. } => LoyaltyError::NotFound(id),
            other => LoyaltyError::Storage(other.to_string()),
        }
    }
}

impl From<url::ParseError> for LoyaltyError {
    fn from(err: url::ParseError) -> Self {
        LoyaltyError::InvalidConfig(format!("invalid URL: {err}"))
    }
}

impl From<std::io::Error> for LoyaltyError {
    fn from(err: std::io::Error) -> Self {
        LoyaltyError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for LoyaltyError {
    fn from(err: toml::de::Error) -> Self {
        LoyaltyError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for LoyaltyError {
    fn from(err: toml::ser::Error) -> Self {
        LoyaltyError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl LoyaltyError {
    /// Returns true for failures that never abort the operation.
    pub fn is_soft(&self) -> bool {
        matches!(self, LoyaltyError::Notification { .. })
    }

    /// Returns true if the caller may simply try again.
    ///
    /// ## Retryable Errors
    /// - Store hiccups
    /// - Pass service failures
    /// - Duplicate scans (after the cooldown)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoyaltyError::Storage(_)
                | LoyaltyError::PassGeneration(_)
                | LoyaltyError::Notification { .. }
                | LoyaltyError::DuplicateScan { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LoyaltyError::InvalidConfig(_)
                | LoyaltyError::ConfigLoadFailed(_)
                | LoyaltyError::ConfigSaveFailed(_)
        )
    }

    /// Message shown to salon staff.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoyaltyError::NotFound(_) => "Cliente no encontrado. Verifique el código QR.",
            LoyaltyError::Storage(_) => "Error al procesar la visita. Intente de nuevo.",
            LoyaltyError::PassGeneration(_) => {
                "Cliente registrado, pero no se pudo generar la tarjeta. Intente de nuevo."
            }
            LoyaltyError::Notification { .. } => {
                "Visita registrada. La tarjeta se actualizará más tarde."
            }
            LoyaltyError::Validation(_) => "Datos inválidos. Revise el formulario.",
            LoyaltyError::DuplicateScan { .. } => "Código ya escaneado. Espere un momento.",
            LoyaltyError::InvalidConfig(_)
            | LoyaltyError::ConfigLoadFailed(_)
            | LoyaltyError::ConfigSaveFailed(_) => "Error de configuración.",
        }
    }
}
