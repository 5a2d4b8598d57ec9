//! # Document Store
//!
//! A schemaless store of JSON documents grouped into named collections.
//! Repositories talk to the [`DocumentStore`] trait and never to a backend
//! directly.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Document Store                                   │
//! │                                                                         │
//! │   CustomerRepository                                                    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   Arc<dyn DocumentStore>                                                │
//! │          │                                                              │
//! │          ├──────────────────────────┬─────────────────────────┐        │
//! │          ▼                          ▼                         │        │
//! │   SqliteDocumentStore        MemoryDocumentStore              │        │
//! │   documents table (WAL)      DashMap, per-entry locks         │        │
//! │   production + seed          unit tests, demos                │        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Versions
//! Every document carries a version that starts at 1 and goes up by one on
//! each write. [`DocumentStore::update_if_version`] writes only when the
//! stored version still matches what the caller read, which turns the
//! read-modify-write of a visit into a compare-and-set.
//!
//! ## Merge Semantics
//! Updates merge at the top level: each key in the update replaces the key
//! in the stored body, keys not mentioned are left alone.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DbResult;

pub mod memory;
pub mod sqlite;
pub mod timestamp;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use timestamp::{decode_timestamp, encode_timestamp, StoreTimestamp};

/// A document body: field name to JSON value.
pub type Fields = Map<String, Value>;

// =============================================================================
// Document
// =============================================================================

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned identifier, unique within its collection.
    pub id: String,

    /// Write counter, starts at 1.
    pub version: i64,

    /// The document body.
    pub fields: Fields,
}

/// A value together with the document version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

impl<T> Versioned<T> {
    /// Maps the value, keeping the version.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            value: f(self.value),
            version: self.version,
        }
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Operations every document store backend provides.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new document and returns it with its assigned id.
    async fn insert(&self, collection: &str, fields: Fields) -> DbResult<Document>;

    /// Fetches one document. Returns `Ok(None)` when the id is absent.
    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>>;

    /// Lists every document in a collection, oldest first.
    async fn list(&self, collection: &str) -> DbResult<Vec<Document>>;

    /// Merges `fields` into an existing document.
    ///
    /// Fails with `DbError::NotFound` when the id is absent; never creates.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DbResult<Document>;

    /// Merges `fields` only if the stored version equals `expected_version`.
    ///
    /// Fails with `DbError::VersionConflict` when another write got there
    /// first, or `DbError::NotFound` when the id is absent.
    async fn update_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        fields: Fields,
    ) -> DbResult<Document>;

    /// Counts the documents in a collection.
    async fn count(&self, collection: &str) -> DbResult<u64>;
}

/// Top-level merge of `update` into `body`.
pub(crate) fn merge_fields(body: &mut Fields, update: Fields) {
    for (key, value) in update {
        body.insert(key, value);
    }
}

/// Generates a new document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
