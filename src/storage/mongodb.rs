//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides [`MongoStore<T>`], a [`DocumentStore`] backed by a
//! `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! postdesk = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per resource type, named after `T::resource_name()`
//! ("accounts", "posts"). Search filters become a `$or` of case-insensitive
//! `$regex` conditions; sort keys map to `1` / `-1`.
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are therefore
//! stored as strings. The `id` field is mapped to MongoDB's `_id` convention.

use crate::core::entity::Resource;
use crate::core::error::StorageError;
use crate::core::query::{Filter, SortKey};
use crate::core::store::DocumentStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use serde_json::{Map, Value};
use uuid::Uuid;

const BACKEND: &str = "mongodb";

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: Value) -> Result<Document, StorageError> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| StorageError::integrity(format!("Failed to convert JSON to BSON: {}", e)))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StorageError::integrity(
                "Expected BSON document, got non-object",
            ));
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn field_name(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// Translate a [`Filter`] into a query document
fn filter_document(filter: &Filter) -> Document {
    if filter.is_match_all() {
        return doc! {};
    }

    let any_of: Vec<Bson> = filter
        .conditions()
        .iter()
        .map(|c| {
            let options = if c.case_insensitive { "i" } else { "" };
            Bson::Document(doc! {
                field_name(c.field): { "$regex": c.pattern.as_str(), "$options": options }
            })
        })
        .collect();

    doc! { "$or": any_of }
}

fn sort_document(sort: &[SortKey]) -> Document {
    let mut doc = Document::new();
    for (field, direction) in sort {
        doc.insert(field_name(field), direction.as_i32());
    }
    doc
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

fn write_error(error: mongodb::error::Error, action: &str) -> StorageError {
    if is_duplicate_key(&error) {
        StorageError::validation(format!("duplicate value: {}", error))
    } else {
        StorageError::query(BACKEND, format!("Failed to {}: {}", action, error))
    }
}

// ---------------------------------------------------------------------------
// MongoStore<T>
// ---------------------------------------------------------------------------

/// Document store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use postdesk::storage::MongoStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoStore::<Account>::new(client.database("postdesk"));
/// store.ensure_indexes().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore<T> {
    database: Database,
    _marker: std::marker::PhantomData<T>,
}

impl<T> MongoStore<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Resource> MongoStore<T> {
    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    /// Create a unique index for every unique field of `T`
    ///
    /// Idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let indexes: Vec<IndexModel> = T::unique_fields()
            .iter()
            .map(|field| {
                IndexModel::builder()
                    .keys(doc! { *field: 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build()
            })
            .collect();

        if indexes.is_empty() {
            return Ok(());
        }

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(|e| StorageError::Connection {
                backend: BACKEND.to_string(),
                message: format!(
                    "Failed to create indexes on {}: {}",
                    T::resource_name(),
                    e
                ),
            })?;

        Ok(())
    }

    fn to_document(record: &T) -> Result<Document, StorageError> {
        let json = serde_json::to_value(record)
            .map_err(|e| StorageError::integrity(format!("Failed to serialize record: {}", e)))?;
        json_to_document(json)
    }

    fn from_document(doc: Document) -> Result<T, StorageError> {
        serde_json::from_value(document_to_json(doc)).map_err(|e| {
            StorageError::integrity(format!("Failed to deserialize record from document: {}", e))
        })
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>, StorageError> {
        let doc = self
            .collection()
            .find_one(filter)
            .await
            .map_err(|e| StorageError::query(BACKEND, format!("Failed to get record: {}", e)))?;

        doc.map(Self::from_document).transpose()
    }
}

#[async_trait]
impl<T: Resource> DocumentStore<T> for MongoStore<T> {
    async fn find(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        limit: usize,
        skip: usize,
    ) -> Result<Vec<T>, StorageError> {
        let cursor = self
            .collection()
            .find(filter_document(filter))
            .sort(sort_document(sort))
            .skip(skip as u64)
            .limit(limit as i64)
            .await
            .map_err(|e| StorageError::query(BACKEND, format!("Failed to list records: {}", e)))?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            StorageError::query(BACKEND, format!("Failed to collect records: {}", e))
        })?;

        docs.into_iter().map(Self::from_document).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StorageError> {
        self.collection()
            .count_documents(filter_document(filter))
            .await
            .map_err(|e| StorageError::query(BACKEND, format!("Failed to count records: {}", e)))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>, StorageError> {
        self.find_one(doc! { "_id": uuid_bson(id) }).await
    }

    async fn find_one_by(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Option<T>, StorageError> {
        self.find_one(doc! { field_name(field): value }).await
    }

    async fn insert(&self, record: T) -> Result<T, StorageError> {
        let doc = Self::to_document(&record)?;

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| write_error(e, "create record"))?;

        Ok(record)
    }

    async fn update_by_id(
        &self,
        id: &Uuid,
        patch: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        let fields = json_to_document(Value::Object(patch.clone()))?;
        if fields.is_empty() {
            return Ok(());
        }

        self.collection()
            .update_one(doc! { "_id": uuid_bson(id) }, doc! { "$set": fields })
            .await
            .map_err(|e| write_error(e, "update record"))?;

        Ok(())
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError> {
        self.collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| StorageError::query(BACKEND, format!("Failed to delete record: {}", e)))?;

        Ok(())
    }
}
