//! Core module containing fundamental traits and types for the crate

pub mod auth;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod query;
pub mod service;
pub mod store;

pub use auth::{AuthError, Claims, JwtTokenIssuer, TokenIssuer, hash_secret, verify_secret};
pub use entity::{Entity, Resource};
pub use error::{ErrorResponse, ServiceError, ServiceResult, StorageError};
pub use extractors::{Caller, ExtractorError};
pub use query::{
    Filter, PaginatedResult, PagingConfig, QueryParams, QuerySpec, ResourceSearchConfig,
    SortDirection, build_query,
};
pub use service::ResourceService;
pub use store::DocumentStore;
