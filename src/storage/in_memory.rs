//! In-memory implementation of DocumentStore for testing and development

use crate::core::entity::{Entity, Resource, merge_patch};
use crate::core::error::StorageError;
use crate::core::query::{Filter, SortDirection, SortKey};
use crate::core::store::DocumentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const BACKEND: &str = "in-memory";

/// In-memory document store
///
/// Useful for testing and development. Uses RwLock for thread-safe access and
/// keeps insertion order, so records that compare equal on every sort key come
/// back in the order they were created. Unique fields declared by the resource
/// are enforced on insert and update.
pub struct InMemoryStore<T> {
    records: Arc<RwLock<IndexMap<Uuid, T>>>,
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<T> InMemoryStore<T> {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> InMemoryStore<T> {
    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record with its JSON form, in insertion order
    fn documents(&self) -> Result<Vec<(T, Value)>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::integrity(format!("Failed to acquire read lock: {}", e)))?;

        records
            .values()
            .map(|record| -> Result<(T, Value), StorageError> {
                Ok((record.clone(), to_document(record)?))
            })
            .collect()
    }

    fn matching(&self, filter: &Filter) -> Result<Vec<(T, Value)>, StorageError> {
        let compiled = filter
            .compile()
            .map_err(|e| StorageError::query(BACKEND, e))?;

        Ok(self
            .documents()?
            .into_iter()
            .filter(|(_, doc)| compiled.matches(doc))
            .collect())
    }
}

fn to_document<T: Entity>(record: &T) -> Result<Value, StorageError> {
    serde_json::to_value(record)
        .map_err(|e| StorageError::integrity(format!("Failed to serialize record: {}", e)))
}

/// Reject `candidate` if another record already holds one of its unique values
fn check_unique<T: Resource>(
    records: &IndexMap<Uuid, T>,
    candidate: &T,
) -> Result<(), StorageError> {
    if T::unique_fields().is_empty() {
        return Ok(());
    }

    let doc = to_document(candidate)?;
    for (id, existing) in records {
        if *id == candidate.id() {
            continue;
        }
        let other = to_document(existing)?;
        for field in T::unique_fields() {
            match (doc.get(*field), other.get(*field)) {
                (Some(a), Some(b)) if !a.is_null() && a == b => {
                    return Err(StorageError::validation(format!(
                        "{} '{}' is already taken",
                        field,
                        a.as_str().map(str::to_string).unwrap_or_else(|| a.to_string())
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.with_timezone(&Utc).cmp(&y.with_timezone(&Utc)),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        // missing or null sorts first, like a document store
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn compare_documents(a: &Value, b: &Value, sort: &[SortKey]) -> Ordering {
    sort.iter()
        .map(|(field, direction)| {
            let ord = compare_values(a.get(*field), b.get(*field));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl<T: Resource> DocumentStore<T> for InMemoryStore<T> {
    async fn find(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        limit: usize,
        skip: usize,
    ) -> Result<Vec<T>, StorageError> {
        let mut matching = self.matching(filter)?;
        matching.sort_by(|(_, a), (_, b)| compare_documents(a, b, sort));

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(record, _)| record)
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StorageError> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|e| StorageError::integrity(format!("Failed to acquire read lock: {}", e)))?;

        Ok(records.get(id).cloned())
    }

    async fn find_one_by(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Option<T>, StorageError> {
        Ok(self
            .documents()?
            .into_iter()
            .find(|(_, doc)| doc.get(field).and_then(Value::as_str) == Some(value))
            .map(|(record, _)| record))
    }

    async fn insert(&self, record: T) -> Result<T, StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::integrity(format!("Failed to acquire write lock: {}", e)))?;

        if records.contains_key(&record.id()) {
            return Err(StorageError::validation(format!(
                "{} with id '{}' already exists",
                T::resource_name_singular(),
                record.id()
            )));
        }
        check_unique(&records, &record)?;

        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update_by_id(
        &self,
        id: &Uuid,
        patch: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::integrity(format!("Failed to acquire write lock: {}", e)))?;

        let Some(existing) = records.get(id) else {
            return Ok(());
        };

        let updated = merge_patch(existing, patch)
            .map_err(|e| StorageError::validation(e.to_string()))?;
        check_unique(&records, &updated)?;

        records.insert(*id, updated);
        Ok(())
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StorageError::integrity(format!("Failed to acquire write lock: {}", e)))?;

        records.shift_remove(id);
        Ok(())
    }
}
