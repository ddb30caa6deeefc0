//! Entities module - contains all business entities

pub mod account;
pub mod post;

// Re-export models for convenience
pub use account::{Account, AccountProfile, AccountService};
pub use post::Post;
