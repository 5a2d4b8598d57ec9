//! # leu-db: Document Store Layer for Leu Loyalty
//!
//! This crate persists customers as schemaless documents. It offers a
//! [`DocumentStore`] trait with a SQLite backend (sqlx) for real use and an
//! in-memory backend for tests, plus the [`CustomerRepository`] that maps
//! documents to [`leu_core::Customer`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Leu Loyalty Data Flow                            │
//! │                                                                         │
//! │  leu-services (register_visit, register, scan, dashboard)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     leu-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (customer.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo  │    │ 001_docs.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                        ┌───────▼───────┐                       │   │
//! │  │                        │ DocumentStore │ SQLite │ Memory       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leu_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("leu.db")).await?;
//! let customer = db.customers().get_by_id("abc123").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::customer::CustomerRepository;
pub use store::{
    Document, DocumentStore, Fields, MemoryDocumentStore, SqliteDocumentStore, StoreTimestamp,
    Versioned,
};
