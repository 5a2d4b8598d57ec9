//! # Database Error Types
//!
//! Error types for document store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error) / bad JSON body (serde_json::Error)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LoyaltyError (leu-services) ← NotFound vs Storage                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  View displays a localized message                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Document store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Document not found.
    ///
    /// ## When This Occurs
    /// - Updating an id that was never created
    /// - Scanned QR code carries a stale id
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Conditional update lost a race.
    ///
    /// ## When This Occurs
    /// - Two scans of the same customer read the same version and both try
    ///   to write; the second one lands here
    #[error("Document {id} changed concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: i64,
        actual: i64,
    },

    /// Store connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created or opened
    /// - Pool closed during shutdown
    /// - In-memory store switched to unavailable (tests)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored document body could not be encoded or decoded.
    ///
    /// ## When This Occurs
    /// - `visitas` holds a string or a negative number
    /// - Body is not a JSON object
    #[error("Invalid document: {0}")]
    Serialization(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns true for a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// Returns true for a lost conditional update.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::VersionConflict { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Document".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Customer", "abc123");
        assert_eq!(err.to_string(), "Customer not found: abc123");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
