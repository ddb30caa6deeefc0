//! Resource service behaviour, observed through a recording store
//!
//! `RecordingStore` wraps the in-memory store and logs every call it
//! receives, so tests can assert which storage operations an action issued.

use async_trait::async_trait;
use postdesk::core::query::{Filter, SortKey};
use postdesk::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Find { limit: usize, skip: usize },
    Count,
    FindById,
    FindOneBy,
    Insert,
    Update,
    Delete,
}

struct RecordingStore<T> {
    inner: InMemoryStore<T>,
    calls: Mutex<Vec<Call>>,
    filters: Mutex<Vec<Filter>>,
    fail_with: Mutex<Option<String>>,
}

impl<T: Resource> RecordingStore<T> {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            calls: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    fn record(&self, call: Call) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().as_ref() {
            Some(message) => Err(StorageError::query("recording", message)),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn reset(&self) {
        self.calls.lock().unwrap().clear();
        self.filters.lock().unwrap().clear();
    }

    fn fail(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl<T: Resource> DocumentStore<T> for RecordingStore<T> {
    async fn find(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        limit: usize,
        skip: usize,
    ) -> Result<Vec<T>, StorageError> {
        self.filters.lock().unwrap().push(filter.clone());
        self.record(Call::Find { limit, skip })?;
        self.inner.find(filter, sort, limit, skip).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StorageError> {
        self.filters.lock().unwrap().push(filter.clone());
        self.record(Call::Count)?;
        self.inner.count(filter).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>, StorageError> {
        self.record(Call::FindById)?;
        self.inner.find_by_id(id).await
    }

    async fn find_one_by(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Option<T>, StorageError> {
        self.record(Call::FindOneBy)?;
        self.inner.find_one_by(field, value).await
    }

    async fn insert(&self, record: T) -> Result<T, StorageError> {
        self.record(Call::Insert)?;
        self.inner.insert(record).await
    }

    async fn update_by_id(
        &self,
        id: &Uuid,
        patch: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        self.record(Call::Update)?;
        self.inner.update_by_id(id, patch).await
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<(), StorageError> {
        self.record(Call::Delete)?;
        self.inner.delete_by_id(id).await
    }
}

fn account_service() -> (ResourceService<Account>, Arc<RecordingStore<Account>>) {
    let store = Arc::new(RecordingStore::<Account>::new());
    let service = ResourceService::new(store.clone(), PagingConfig::default());
    (service, store)
}

fn query(pairs: &[(&str, &str)]) -> QueryParams {
    let pairs: serde_json::Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    serde_json::from_value(Value::Object(pairs)).unwrap()
}

async fn seed(service: &ResourceService<Account>, users: &[(&str, &str, Option<&str>)]) {
    for (username, email, tel) in users {
        service
            .create(json!({
                "username": username,
                "email": email,
                "tel": tel,
                "password": "password123"
            }))
            .await
            .unwrap();
    }
}

// ============================================================================
// list
// ============================================================================

#[tokio::test]
async fn test_list_fetches_page_and_count_with_same_filter() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    store.reset();

    service
        .list(&query(&[("search", "Alice"), ("fields", "username")]))
        .await
        .unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&Call::Find { limit: 20, skip: 0 }));
    assert!(calls.contains(&Call::Count));

    let filters = store.filters.lock().unwrap().clone();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0], filters[1]);
    assert_eq!(filters[0].conditions().len(), 1);
    assert_eq!(filters[0].conditions()[0].field, "username");
}

#[tokio::test]
async fn test_list_username_search_is_case_insensitive() {
    let (service, _) = account_service();
    seed(
        &service,
        &[
            ("alice", "a@example.com", None),
            ("malice", "m@example.com", None),
            ("bob", "b@example.com", None),
        ],
    )
    .await;

    let page = service
        .list(&query(&[("search", "Alice"), ("fields", "username")]))
        .await
        .unwrap();

    let mut names: Vec<_> = page.rows.iter().map(|a| a.username.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["alice", "malice"]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_list_phone_search_ignores_formatting() {
    let (service, _) = account_service();
    seed(
        &service,
        &[
            ("alice", "a@example.com", Some("0841234567")),
            ("bob", "b@example.com", Some("0999999999")),
        ],
    )
    .await;

    for search in ["084-123-4567", "0841234567", "084 123"] {
        let page = service
            .list(&query(&[("search", search), ("fields", "tel")]))
            .await
            .unwrap();
        assert_eq!(page.total, 1, "search {search:?}");
        assert_eq!(page.rows[0].username, "alice");
    }
}

#[tokio::test]
async fn test_list_paging_envelope() {
    let (service, store) = account_service();
    let users: Vec<(String, String)> = (0..7)
        .map(|i| (format!("user{i}"), format!("user{i}@example.com")))
        .collect();
    for (username, email) in &users {
        seed(&service, &[(username.as_str(), email.as_str(), None)]).await;
    }
    store.reset();

    let page = service
        .list(&query(&[("page", "3"), ("limit", "3")]))
        .await
        .unwrap();

    assert_eq!(page.total, 7);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.curr_page, 3);
    assert_eq!(page.rows.len(), 1);
    assert!(store.calls().contains(&Call::Find { limit: 3, skip: 6 }));
}

#[tokio::test]
async fn test_list_empty_collection() {
    let (service, _) = account_service();
    let page = service.list(&QueryParams::default()).await.unwrap();

    let body = serde_json::to_value(&page).unwrap();
    assert_eq!(
        body,
        json!({ "total": 0, "lastPage": 0, "currPage": 1, "rows": [] })
    );
}

#[tokio::test]
async fn test_list_uses_configured_default_limit() {
    let store = Arc::new(RecordingStore::<Account>::new());
    let service = ResourceService::new(
        store.clone(),
        PagingConfig {
            default_limit: 5,
            max_limit: 100,
        },
    );

    service.list(&QueryParams::default()).await.unwrap();
    assert!(store.calls().contains(&Call::Find { limit: 5, skip: 0 }));
}

#[tokio::test]
async fn test_list_propagates_storage_failure() {
    let (service, store) = account_service();
    store.fail("connection reset");

    let err = service.list(&QueryParams::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(StorageError::Query { .. })));
}

// ============================================================================
// get_by_id
// ============================================================================

#[tokio::test]
async fn test_get_by_id_malformed_and_missing_look_the_same() {
    let (service, store) = account_service();

    let malformed = service.get_by_id("not-a-uuid").await.unwrap_err();
    assert!(store.calls().is_empty(), "malformed id must not reach storage");

    let missing = service
        .get_by_id(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();

    assert!(matches!(malformed, ServiceError::NotFound { .. }));
    assert!(matches!(missing, ServiceError::NotFound { .. }));
    assert_eq!(malformed.to_string(), missing.to_string());
}

#[tokio::test]
async fn test_get_by_id_storage_failure_is_not_not_found() {
    let (service, store) = account_service();
    store.fail("timeout");

    let err = service
        .get_by_id(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));
}

// ============================================================================
// create
// ============================================================================

#[tokio::test]
async fn test_create_assigns_identity_and_hashes_password() {
    let (service, _) = account_service();
    let account = service
        .create(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "username": "alice",
            "email": "alice@example.com",
            "password": "password123"
        }))
        .await
        .unwrap();

    assert_ne!(account.id, Uuid::nil());
    assert_eq!(account.created_at, account.updated_at);
    assert!(account.verify_password("password123"));
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let (service, store) = account_service();

    let missing = service
        .create(json!({ "username": "alice", "password": "password123" }))
        .await
        .unwrap_err();
    assert!(matches!(missing, ServiceError::BadRequest(_)));

    let invalid = service
        .create(json!({ "username": "alice", "email": "nope", "password": "password123" }))
        .await
        .unwrap_err();
    assert!(matches!(invalid, ServiceError::BadRequest(_)));

    assert!(!store.calls().contains(&Call::Insert));
}

#[tokio::test]
async fn test_create_duplicate_username_is_bad_request() {
    let (service, _) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;

    let err = service
        .create(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "password123"
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(ref m) if m.contains("username")));
}

// ============================================================================
// update
// ============================================================================

#[tokio::test]
async fn test_update_missing_record_issues_no_write() {
    let (service, store) = account_service();

    let patch = json!({ "tel": "123" }).as_object().cloned().unwrap();
    let err = service
        .update(&Uuid::new_v4().to_string(), patch)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { .. }));
    assert_eq!(store.calls(), vec![Call::FindById]);
}

#[tokio::test]
async fn test_update_returns_merged_record_without_reread() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    let alice = service.list(&QueryParams::default()).await.unwrap().rows[0].clone();
    store.reset();

    let patch = json!({
        "tel": "0841234567",
        "created_at": "2000-01-01T00:00:00Z",
        "role": "admin"
    })
    .as_object()
    .cloned()
    .unwrap();
    let updated = service.update(&alice.id.to_string(), patch).await.unwrap();

    assert_eq!(updated.tel.as_deref(), Some("0841234567"));
    assert_eq!(updated.created_at, alice.created_at);
    assert!(updated.updated_at >= alice.updated_at);
    assert_eq!(store.calls(), vec![Call::FindById, Call::Update]);
}

#[tokio::test]
async fn test_update_with_wrong_type_issues_no_write() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    let alice = service.list(&QueryParams::default()).await.unwrap().rows[0].clone();
    store.reset();

    let patch = json!({ "username": 5 }).as_object().cloned().unwrap();
    let err = service.update(&alice.id.to_string(), patch).await.unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(store.calls(), vec![Call::FindById]);
}

#[tokio::test]
async fn test_update_applies_creation_rules() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    let alice = service.list(&QueryParams::default()).await.unwrap().rows[0].clone();
    store.reset();

    let patch = json!({ "username": "a", "email": "nope" })
        .as_object()
        .cloned()
        .unwrap();
    let err = service.update(&alice.id.to_string(), patch).await.unwrap_err();

    let ServiceError::BadRequest(message) = err else {
        panic!("expected BadRequest, got {err:?}");
    };
    assert!(message.contains("username"));
    assert!(message.contains("email"));
    assert!(!store.calls().contains(&Call::Update));

    let unchanged = service.get_by_id(&alice.id.to_string()).await.unwrap();
    assert_eq!(unchanged.username, "alice");
    assert_eq!(unchanged.email, "alice@example.com");
}

#[tokio::test]
async fn test_post_update_rejects_empty_and_oversized_titles() {
    let store = Arc::new(RecordingStore::<Post>::new());
    let service = ResourceService::new(store.clone(), PagingConfig::default());
    let post = service
        .create(json!({ "title": "Hello", "author": Uuid::new_v4() }))
        .await
        .unwrap();
    store.reset();

    for title in [String::new(), "x".repeat(10_000)] {
        let patch = json!({ "title": title }).as_object().cloned().unwrap();
        let err = service.update(&post.id.to_string(), patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    let patch = json!({ "title": 5 }).as_object().cloned().unwrap();
    let err = service.update(&post.id.to_string(), patch).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    assert!(!store.calls().contains(&Call::Update));
    assert_eq!(service.get_by_id(&post.id.to_string()).await.unwrap().title, "Hello");
}

#[tokio::test]
async fn test_update_propagates_storage_failure() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    let alice = service.list(&QueryParams::default()).await.unwrap().rows[0].clone();

    store.fail("write concern");
    let patch = json!({ "tel": "1" }).as_object().cloned().unwrap();
    let err = service.update(&alice.id.to_string(), patch).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));
}

// ============================================================================
// delete
// ============================================================================

#[tokio::test]
async fn test_delete_missing_record_issues_no_delete() {
    let (service, store) = account_service();

    let err = service
        .delete(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { .. }));
    assert!(!store.calls().contains(&Call::Delete));
}

#[tokio::test]
async fn test_delete_existing_record() {
    let (service, store) = account_service();
    seed(&service, &[("alice", "alice@example.com", None)]).await;
    let alice = service.list(&QueryParams::default()).await.unwrap().rows[0].clone();
    store.reset();

    service.delete(&alice.id.to_string()).await.unwrap();
    assert_eq!(store.calls(), vec![Call::FindById, Call::Delete]);

    let err = service.get_by_id(&alice.id.to_string()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
