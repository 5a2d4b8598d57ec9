//! # SQLite Document Store
//!
//! Stores documents as JSON text in a single `documents` table keyed by
//! `(collection, id)`.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_if_version(id, expected = 4, {visitas: 5})                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT data, version ... WHERE collection = ? AND id = ?               │
//! │       │  (version != 4 → VersionConflict, no row → NotFound)            │
//! │       ▼                                                                 │
//! │  merge body in Rust                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE documents SET data = ?, version = version + 1                   │
//! │   WHERE collection = ? AND id = ? AND version = 4                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rows_affected == 0 → someone wrote in between → VersionConflict        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The version check lives in the `UPDATE` itself, so two connections can
//! never both succeed from the same read.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{merge_fields, new_document_id, Document, DocumentStore, Fields};
use crate::error::{DbError, DbResult};

/// Attempts for an unconditional merge before giving up on a hot document.
const MAX_MERGE_ATTEMPTS: usize = 8;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: String,
    version: i64,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DbError;

    fn try_from(row: DocumentRow) -> DbResult<Self> {
        let fields = match serde_json::from_str(&row.data)? {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(DbError::Serialization(format!(
                    "document {} body is not an object: {}",
                    row.id, other
                )))
            }
        };

        Ok(Document {
            id: row.id,
            version: row.version,
            fields,
        })
    }
}

/// Document store over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Creates a store over an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteDocumentStore { pool }
    }

    async fn write_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        body: &Fields,
    ) -> DbResult<bool> {
        let data = serde_json::to_string(body)?;

        let result = sqlx::query(
            r#"
            UPDATE documents
               SET data = ?, version = version + 1, updated_at = ?
             WHERE collection = ? AND id = ? AND version = ?
            "#,
        )
        .bind(data)
        .bind(Utc::now())
        .bind(collection)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: &str, fields: Fields) -> DbResult<Document> {
        let id = new_document_id();
        let now = Utc::now();
        let data = serde_json::to_string(&fields)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, version, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(collection, id = %id, "Inserted document");

        Ok(Document {
            id,
            version: 1,
            fields,
        })
    }

    async fn get(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, version FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn list(&self, collection: &str) -> DbResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data, version FROM documents
             WHERE collection = ?
             ORDER BY created_at, rowid
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DbResult<Document> {
        for attempt in 1..=MAX_MERGE_ATTEMPTS {
            let current = self
                .get(collection, id)
                .await?
                .ok_or_else(|| DbError::not_found("Document", id))?;

            let mut body = current.fields;
            merge_fields(&mut body, fields.clone());

            if self
                .write_if_version(collection, id, current.version, &body)
                .await?
            {
                return Ok(Document {
                    id: id.to_string(),
                    version: current.version + 1,
                    fields: body,
                });
            }

            debug!(collection, id, attempt, "Document changed during merge, retrying");
        }

        warn!(collection, id, "Gave up merging into a busy document");
        Err(DbError::Internal(format!(
            "document {id} kept changing during update"
        )))
    }

    async fn update_if_version(
        &self,
        collection: &str,
        id: &str,
        expected_version: i64,
        fields: Fields,
    ) -> DbResult<Document> {
        let current = self
            .get(collection, id)
            .await?
            .ok_or_else(|| DbError::not_found("Document", id))?;

        if current.version != expected_version {
            return Err(DbError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let mut body = current.fields;
        merge_fields(&mut body, fields);

        if !self
            .write_if_version(collection, id, expected_version, &body)
            .await?
        {
            let actual = match self.get(collection, id).await? {
                Some(doc) => doc.version,
                None => return Err(DbError::not_found("Document", id)),
            };
            return Err(DbError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual,
            });
        }

        Ok(Document {
            id: id.to_string(),
            version: expected_version + 1,
            fields: body,
        })
    }

    async fn count(&self, collection: &str) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pool::{Database, DbConfig};

    fn body(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn store() -> SqliteDocumentStore {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.documents()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = store().await;
        let doc = store
            .insert("clientes", body(json!({"nombre": "Ana", "visitas": 0})))
            .await
            .unwrap();

        let fetched = store.get("clientes", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert!(store.get("otros", &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_in_insert_order() {
        let store = store().await;
        let first = store.insert("c", body(json!({"n": 1}))).await.unwrap();
        let second = store.insert("c", body(json!({"n": 2}))).await.unwrap();

        let ids: Vec<String> = store.list("c").await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(store.count("c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_bumps_version() {
        let store = store().await;
        let doc = store
            .insert("c", body(json!({"nombre": "Ana", "visitas": 0})))
            .await
            .unwrap();

        let updated = store
            .update("c", &doc.id, body(json!({"visitas": 1})))
            .await
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.fields["nombre"], "Ana");
        assert_eq!(updated.fields["visitas"], 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = store().await;
        let err = store
            .update("c", "missing", body(json!({"visitas": 1})))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = store().await;
        let doc = store.insert("c", body(json!({"visitas": 0}))).await.unwrap();

        store
            .update_if_version("c", &doc.id, 1, body(json!({"visitas": 1})))
            .await
            .unwrap();

        let err = store
            .update_if_version("c", &doc.id, 1, body(json!({"visitas": 1})))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let stored = store.get("c", &doc.id).await.unwrap().unwrap();
        assert_eq!(stored.fields["visitas"], 1);
        assert_eq!(stored.version, 2);
    }
}
