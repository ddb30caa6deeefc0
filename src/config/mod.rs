//! Configuration loading and management

use crate::core::query::PagingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Secret used when none is configured; only suitable for development
pub const DEV_JWT_SECRET: &str = "postdesk-dev-secret-change-me";

/// Listener address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token signing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,

    /// Lifetime of an access token, in minutes
    pub access_token_ttl_mins: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_mins: 60,
        }
    }
}

/// Complete application configuration
///
/// Every section has defaults, so an empty document is a valid config:
///
/// ```yaml
/// server:
///   host: 0.0.0.0
///   port: 8080
/// paging:
///   default_limit: 20
///   max_limit: 100
/// auth:
///   jwt_secret: change-me
///   access_token_ttl_mins: 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paging: PagingConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `POSTDESK_*` overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    ///
    /// Recognised keys: `POSTDESK_HOST`, `POSTDESK_PORT`,
    /// `POSTDESK_JWT_SECRET`, `POSTDESK_PAGE_LIMIT`.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup("POSTDESK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("POSTDESK_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("POSTDESK_PORT is not a port number: {}", port))?;
        }
        if let Some(secret) = lookup("POSTDESK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(limit) = lookup("POSTDESK_PAGE_LIMIT") {
            self.paging.default_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("POSTDESK_PAGE_LIMIT is not a number: {}", limit))?;
        }
        Ok(self)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}
