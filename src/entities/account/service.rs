//! Account operations on top of the generic resource service

use super::model::{Account, AccountProfile};
use crate::core::auth::{Claims, TokenIssuer};
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::service::ResourceService;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Token refresh request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
}

/// Result of a successful login or refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub account: AccountProfile,
}

/// CRUD for accounts plus login and token refresh
///
/// Derefs to [`ResourceService<Account>`] for the shared operations.
#[derive(Clone)]
pub struct AccountService {
    resources: ResourceService<Account>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountService {
    pub fn new(resources: ResourceService<Account>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { resources, tokens }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenIssuer> {
        &self.tokens
    }

    /// Exchange credentials for an access token
    ///
    /// An unknown username and a wrong password fail with the same error.
    pub async fn login(&self, credentials: &Credentials) -> ServiceResult<AuthSession> {
        let account = self
            .resources
            .store()
            .find_one_by("username", credentials.username.trim())
            .await?
            .filter(|account| account.verify_password(&credentials.password));

        let Some(account) = account else {
            tracing::warn!(username = %credentials.username, "rejected login");
            return Err(ServiceError::Unauthorized);
        };

        let session = self.issue(account).await?;
        tracing::info!(account = %session.account.id, "login succeeded");
        Ok(session)
    }

    /// Issue a fresh token for the account named in `token`
    ///
    /// The old token's signature and expiry are not checked; the account it
    /// names must still exist.
    pub async fn refresh_token(&self, token: &str) -> ServiceResult<AuthSession> {
        let claims = self.tokens.decode_unverified(token).map_err(|e| {
            tracing::warn!(error = %e, "rejected token refresh");
            ServiceError::Unauthorized
        })?;

        let account = self
            .resources
            .store()
            .find_one_by("username", &claims.username)
            .await?
            .ok_or_else(|| {
                tracing::warn!(username = %claims.username, "refresh for unknown account");
                ServiceError::Unauthorized
            })?;

        self.issue(account).await
    }

    async fn issue(&self, account: Account) -> ServiceResult<AuthSession> {
        let claims = Claims::new(account.id, &account.username, self.tokens.ttl_mins());
        let access_token = self
            .tokens
            .sign(&claims)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(AuthSession {
            access_token,
            account: account.into(),
        })
    }
}

impl Deref for AccountService {
    type Target = ResourceService<Account>;

    fn deref(&self) -> &Self::Target {
        &self.resources
    }
}
