//! # Postdesk
//!
//! A small accounts-and-posts REST backend with a safe dynamic list query
//! builder at its core.
//!
//! ## Features
//!
//! - **Dynamic list queries**: free-text search, field selection, sorting and
//!   pagination from query-string parameters, restricted to per-resource
//!   allowlists
//! - **Literal search**: search text is escaped, so `a+b` matches `a+b`
//! - **Phone normalization**: `084-123-4567` and `0841234567` find the same
//!   account
//! - **Uniform CRUD**: one generic [`ResourceService`](core::service::ResourceService)
//!   per resource with a single error contract
//! - **Token auth**: login and refresh issue HS256 JWTs, posts require a
//!   bearer token
//! - **Pluggable storage**: in-memory by default, MongoDB behind the
//!   `mongodb_backend` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use postdesk::prelude::*;
//!
//! let config = AppConfig::from_yaml_str("server:\n  port: 8080\n")?.apply_env()?;
//! let state = AppState::in_memory(&config);
//! serve(&config, state).await?;
//! ```
//!
//! ## List queries
//!
//! ```text
//! GET /users?search=alice&fields=username,email&orderByField=username&orderBy=desc&page=2&limit=10
//! ```
//!
//! answers `{ "total": .., "lastPage": .., "currPage": 2, "rows": [..] }`.

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{Claims, JwtTokenIssuer, TokenIssuer, hash_secret},
        entity::{Entity, Resource},
        error::{ServiceError, ServiceResult, StorageError},
        extractors::Caller,
        query::{
            PaginatedResult, PagingConfig, QueryParams, QuerySpec, ResourceSearchConfig,
            SortDirection, build_query,
        },
        service::ResourceService,
        store::DocumentStore,
    };

    // === Entities ===
    pub use crate::entities::{
        Account, AccountProfile, AccountService, Post,
        account::{AuthSession, Credentials},
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AppState, build_router, serve};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
