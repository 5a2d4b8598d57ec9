//! In-memory document store.
//!
//! Backed by a `DashMap`, so concurrent writers to different documents never
//! contend and a conditional update holds the entry lock for the whole
//! compare-and-set. Used by unit tests and demos; nothing survives a restart.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::{merge_fields, new_document_id, Document, DocumentStore, Fields};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
struct Entry {
    fields: Fields,
    version: i64,
    seq: u64,
}

/// Document store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: Arc<DashMap<(String, String), Entry>>,
    next_seq: AtomicU64,
    writes: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts and updates so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with `ConnectionFailed`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    fn to_document(id: &str, entry: &Entry) -> Document {
        Document {
            id: id.to_string(),
            version: entry.version,
            fields: entry.fields.clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, fields: Fields) -> DbResult<Document> {
        self.check_available()?;

        let id = new_document_id();
        let entry = Entry {
            fields,
            version: 1,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
        };
        let doc = Self::to_document(&id, &entry);

        self.docs.insert(Self::key(collection, &id), entry);
        self.writes.fetch_add(1, Ordering::SeqCst);

        trace!(collection, id = %doc.id, "Inserted document");
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        self.check_available()?;

        Ok(self
            .docs
            .get(&Self::key(collection, id))
            .map(|entry| Self::to_document(id, entry.value())))
    }

    async fn list(&self, collection: &str) -> DbResult<Vec<Document>> {
        self.check_available()?;

        let mut entries: Vec<(u64, Document)> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| {
                (
                    entry.value().seq,
                    Self::to_document(&entry.key().1, entry.value()),
                )
            })
            .collect();

        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DbResult<Document> {
        self.check_available()?;

        let mut entry = self
            .docs
            .get_mut(&Self::key(collection, id))
            .ok_or_else(|| DbError::not_found("Document", id))?;

        merge_fields(&mut entry.fields, fields);
        entry.version += 1;
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(Self::to_document(id, &entry))
    }

    async fn update_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        fields: Fields,
    ) -> DbResult<Document> {
        self.check_available()?;

        let mut entry = self
            .docs
            .get_mut(&Self::key(collection, id))
            .ok_or_else(|| DbError::not_found("Document", id))?;

        if entry.version != expected_version {
            return Err(DbError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: entry.version,
            });
        }

        merge_fields(&mut entry.fields, fields);
        entry.version += 1;
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(Self::to_document(id, &entry))
    }

    async fn count(&self, collection: &str) -> DbResult<u64> {
        self.check_available()?;

        let count = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count();
        Ok(count as u64)
    }
}
