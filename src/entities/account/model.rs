//! Account entity model

use crate::core::auth::{hash_secret, verify_secret};
use crate::core::entity::{Entity, Resource};
use crate::core::error::ServiceError;
use crate::core::query::{ResourceSearchConfig, digits_only};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

static SEARCH: ResourceSearchConfig =
    ResourceSearchConfig::new(&["username", "email", "tel"]).with_phone_field("tel");

/// A registered user
///
/// Only the SHA-256 digest of the password is stored. Use
/// [`AccountProfile`] for anything that leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Account {
    pub id: Uuid,
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[serde(default)]
    pub tel: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Telephone numbers are stored as digits only, matching how they are searched
fn normalize_tel(tel: &str) -> Option<String> {
    Some(digits_only(tel)).filter(|digits| !digits.is_empty())
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        tel: Option<&str>,
        password: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            tel: tel.and_then(normalize_tel),
            password_hash: hash_secret(password),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        verify_secret(candidate, &self.password_hash)
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile::from(self.clone())
    }
}

/// Fields accepted when registering an account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 3, max = 64, message = "username must be 3 to 64 characters"))]
    pub username: String,

    #[validate(email(message = "email is not a valid address"))]
    pub email: String,

    #[serde(default)]
    pub tel: Option<String>,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Public view of an account, without the password digest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub tel: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            tel: account.tel,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl Entity for Account {
    fn resource_name() -> &'static str {
        "accounts"
    }

    fn resource_name_singular() -> &'static str {
        "account"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Resource for Account {
    type Draft = NewAccount;

    fn search_config() -> &'static ResourceSearchConfig {
        &SEARCH
    }

    fn from_draft(draft: NewAccount) -> Self {
        Account::new(
            draft.username.trim(),
            draft.email.trim(),
            draft.tel.as_deref(),
            &draft.password,
        )
    }

    fn patchable_fields() -> &'static [&'static str] {
        &["username", "email", "tel", "password_hash"]
    }

    fn unique_fields() -> &'static [&'static str] {
        &["username", "email"]
    }

    /// A plain `password` is replaced by its digest; a caller-supplied
    /// `password_hash` is never trusted. `tel` is reduced to digits.
    fn prepare_patch(patch: &mut Map<String, Value>) -> Result<(), ServiceError> {
        patch.remove("password_hash");

        if let Some(Value::String(tel)) = patch.get("tel") {
            let tel = normalize_tel(tel).map_or(Value::Null, Value::String);
            patch.insert("tel".to_string(), tel);
        }

        match patch.remove("password") {
            None => Ok(()),
            Some(Value::String(password)) if password.len() >= 6 => {
                patch.insert(
                    "password_hash".to_string(),
                    Value::String(hash_secret(&password)),
                );
                Ok(())
            }
            Some(Value::String(_)) => Err(ServiceError::BadRequest(
                "password must be at least 6 characters".to_string(),
            )),
            Some(_) => Err(ServiceError::BadRequest(
                "password must be a string".to_string(),
            )),
        }
    }
}
