//! Shared application state handed to every handler

use crate::config::AppConfig;
use crate::core::auth::{JwtTokenIssuer, TokenIssuer};
use crate::core::service::ResourceService;
use crate::core::store::DocumentStore;
use crate::entities::{Account, AccountService, Post};
use crate::storage::InMemoryStore;
use axum::extract::FromRef;
use std::sync::Arc;

/// Services and collaborators shared by all requests
///
/// Cloning is cheap: every field is a handle onto shared state.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: ResourceService<Post>,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppState {
    /// Wire services over the given stores
    pub fn new(
        config: &AppConfig,
        account_store: Arc<dyn DocumentStore<Account>>,
        post_store: Arc<dyn DocumentStore<Post>>,
    ) -> Self {
        let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtTokenIssuer::new(
            &config.auth.jwt_secret,
            config.auth.access_token_ttl_mins,
        ));

        Self {
            accounts: AccountService::new(
                ResourceService::new(account_store, config.paging),
                tokens.clone(),
            ),
            posts: ResourceService::new(post_store, config.paging),
            tokens,
        }
    }

    /// State backed by fresh in-memory stores
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryStore::<Account>::new()),
            Arc::new(InMemoryStore::<Post>::new()),
        )
    }
}
