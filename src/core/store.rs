//! Storage driver contract consumed by resource services

use crate::core::entity::Entity;
use crate::core::error::StorageError;
use crate::core::query::{Filter, SortKey};
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Trait for document stores holding one record type
///
/// The store executes the [`Filter`] and sort keys built by
/// [`build_query`](crate::core::query::build_query); it never sees raw
/// request input. Implementations are agnostic to the resource they hold.
#[async_trait]
pub trait DocumentStore<T: Entity>: Send + Sync {
    /// Fetch up to `limit` matching records, sorted, after skipping `skip`
    async fn find(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        limit: usize,
        skip: usize,
    ) -> Result<Vec<T>, StorageError>;

    /// Count every matching record, ignoring paging
    async fn count(&self, filter: &Filter) -> Result<u64, StorageError>;

    /// Get a record by ID
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>, StorageError>;

    /// Get the first record whose `field` equals `value` exactly
    async fn find_one_by(&self, field: &'static str, value: &str)
    -> Result<Option<T>, StorageError>;

    /// Persist a new record
    ///
    /// Uniqueness or shape violations are reported as
    /// [`StorageError::Validation`].
    async fn insert(&self, record: T) -> Result<T, StorageError>;

    /// Set the given fields on an existing record
    async fn update_by_id(&self, id: &Uuid, patch: &Map<String, Value>)
    -> Result<(), StorageError>;

    /// Remove a record
    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError>;
}
