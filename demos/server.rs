//! Postdesk demo server
//!
//! ```bash
//! cargo run --example server                   # defaults, in-memory storage
//! POSTDESK_CONFIG=postdesk.yaml cargo run --example server
//! ```

use postdesk::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::var("POSTDESK_CONFIG") {
        Ok(path) => AppConfig::from_yaml_file(&path)?,
        Err(_) => AppConfig::default(),
    }
    .apply_env()?;

    let state = AppState::in_memory(&config);

    // a known account so login works out of the box
    let demo = state
        .accounts
        .create(serde_json::json!({
            "username": "demo",
            "email": "demo@example.com",
            "tel": "084-123-4567",
            "password": "demo1234"
        }))
        .await?;
    tracing::info!(account = %demo.id, "seeded demo account (demo / demo1234)");

    serve(&config, state).await
}
