//! Entity traits defining the core abstraction for all record types

use crate::core::error::ServiceError;
use crate::core::query::ResourceSearchConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Fields no partial update may touch
pub const IMMUTABLE_FIELDS: &[&str] = &["id", "_id", "created_at"];

/// Base trait for all stored records.
///
/// Every record has:
/// - id: Unique identifier
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
///
/// Records round-trip through `serde_json::Value`, which is how stores and
/// partial updates see them.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The plural resource name, also the collection name (e.g., "accounts")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "account")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;
}

/// A record type served by a [`ResourceService`](crate::core::service::ResourceService).
///
/// The record's own [`Validate`] rules mirror those of its draft; they are
/// checked on the merged record before a partial update is written.
pub trait Resource: Entity + Validate {
    /// Caller-supplied fields for a new record
    type Draft: DeserializeOwned + Validate + Send;

    /// Search/sort allowlist and defaults for list requests
    fn search_config() -> &'static ResourceSearchConfig;

    /// Build a new record (fresh identity and timestamps) from a validated draft
    fn from_draft(draft: Self::Draft) -> Self;

    /// Fields a partial update may set
    fn patchable_fields() -> &'static [&'static str];

    /// Fields whose values must be unique across the collection
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Rewrite a caller patch before it reaches storage
    ///
    /// Runs before the patch is restricted to [`Resource::patchable_fields`].
    fn prepare_patch(_patch: &mut Map<String, Value>) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Shallow-merge `patch` into `record`, returning the merged record
///
/// Identity and creation time are never overwritten.
pub fn merge_patch<T: Entity>(record: &T, patch: &Map<String, Value>) -> serde_json::Result<T> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        for (key, v) in patch {
            if !IMMUTABLE_FIELDS.contains(&key.as_str()) {
                fields.insert(key.clone(), v.clone());
            }
        }
    }
    serde_json::from_value(value)
}
