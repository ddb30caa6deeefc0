//! Account entity module

pub mod handlers;
pub mod model;
pub mod service;

pub use handlers::*;
pub use model::{Account, AccountProfile, NewAccount};
pub use service::{AccountService, AuthSession, Credentials, RefreshRequest};
