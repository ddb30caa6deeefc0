//! Generic CRUD service shared by every resource type

use crate::core::entity::{IMMUTABLE_FIELDS, Resource, merge_patch};
use crate::core::error::{ServiceError, ServiceResult, StorageError};
use crate::core::query::{PagingConfig, PaginatedResult, QueryParams, build_query};
use crate::core::store::DocumentStore;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// CRUD operations for one resource type
///
/// Every operation is a chain of guard clauses: the first failure is returned
/// and nothing after it runs. The service holds no state besides its store
/// handle and paging defaults, so clones are cheap and share the store.
pub struct ResourceService<T: Resource> {
    store: Arc<dyn DocumentStore<T>>,
    paging: PagingConfig,
}

impl<T: Resource> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            paging: self.paging,
        }
    }
}

impl<T: Resource> ResourceService<T> {
    pub fn new(store: Arc<dyn DocumentStore<T>>, paging: PagingConfig) -> Self {
        Self { store, paging }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore<T>> {
        &self.store
    }

    pub fn paging(&self) -> &PagingConfig {
        &self.paging
    }

    /// One page of records matching the request, plus totals
    ///
    /// The page and the count run concurrently against the same filter.
    pub async fn list(&self, params: &QueryParams) -> ServiceResult<PaginatedResult<T>> {
        let spec = build_query(params, T::search_config(), &self.paging);

        let (rows, total) = futures::try_join!(
            self.store
                .find(&spec.filter, &spec.sort, spec.limit, spec.skip),
            self.store.count(&spec.filter),
        )?;

        tracing::debug!(
            resource = T::resource_name(),
            total,
            rows = rows.len(),
            "listed records"
        );

        Ok(PaginatedResult::new(rows, total, &spec))
    }

    /// Fetch one record
    ///
    /// An identity that is not a valid UUID is reported exactly like a
    /// missing record.
    pub async fn get_by_id(&self, id: &str) -> ServiceResult<T> {
        let not_found = || ServiceError::not_found(T::resource_name_singular());

        let id = Uuid::parse_str(id.trim()).map_err(|_| not_found())?;
        self.store.find_by_id(&id).await?.ok_or_else(not_found)
    }

    /// Validate caller fields and persist a new record
    pub async fn create(&self, data: Value) -> ServiceResult<T> {
        let draft: T::Draft =
            serde_json::from_value(data).map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        draft.validate()?;

        let record = T::from_draft(draft);
        let created = self.store.insert(record).await.map_err(|e| match e {
            StorageError::Validation { message } => ServiceError::BadRequest(message),
            other => ServiceError::Storage(other),
        })?;

        tracing::debug!(
            resource = T::resource_name(),
            id = %created.id(),
            "created record"
        );
        Ok(created)
    }

    /// Apply a partial update
    ///
    /// The merged record must deserialize and pass the same rules as a new
    /// one before anything is written. Returns the record as fetched before
    /// the write, merged with the applied fields. Storage is not read again.
    pub async fn update(&self, id: &str, mut patch: Map<String, Value>) -> ServiceResult<T> {
        let existing = self.get_by_id(id).await?;

        T::prepare_patch(&mut patch)?;
        let patch = restrict_patch::<T>(patch);

        let merged =
            merge_patch(&existing, &patch).map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        merged.validate()?;

        self.store.update_by_id(&existing.id(), &patch).await?;

        tracing::debug!(
            resource = T::resource_name(),
            id = %existing.id(),
            fields = patch.len(),
            "updated record"
        );

        Ok(merged)
    }

    /// Remove an existing record
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let existing = self.get_by_id(id).await?;
        self.store.delete_by_id(&existing.id()).await?;

        tracing::debug!(
            resource = T::resource_name(),
            id = %existing.id(),
            "deleted record"
        );
        Ok(())
    }
}

/// Keep only patchable fields and stamp the modification time
fn restrict_patch<T: Resource>(patch: Map<String, Value>) -> Map<String, Value> {
    let mut restricted: Map<String, Value> = patch
        .into_iter()
        .filter(|(key, _)| {
            let keep = !IMMUTABLE_FIELDS.contains(&key.as_str())
                && T::patchable_fields().contains(&key.as_str());
            if !keep {
                tracing::debug!(resource = T::resource_name(), field = %key, "dropped patch field");
            }
            keep
        })
        .collect();

    restricted.insert("updated_at".to_string(), serde_json::json!(Utc::now()));
    restricted
}
