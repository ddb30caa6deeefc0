//! Serve loop with graceful shutdown

use super::router::build_router;
use super::state::AppState;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use tokio::net::TcpListener;

/// Bind the configured address and serve until SIGTERM or Ctrl+C
///
/// # Example
///
/// ```rust,ignore
/// let config = AppConfig::from_yaml_file("postdesk.yaml")?.apply_env()?;
/// let state = AppState::in_memory(&config);
/// postdesk::server::serve(&config, state).await?;
/// ```
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    if config.uses_dev_secret() {
        tracing::warn!("No JWT secret configured, using the development secret");
    }

    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
