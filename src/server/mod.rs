//! HTTP server: routes, shared state and the serve loop

pub mod builder;
pub mod router;
pub mod state;

pub use builder::serve;
pub use router::build_router;
pub use state::AppState;
