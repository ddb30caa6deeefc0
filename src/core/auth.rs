//! Token issuance and secret hashing
//!
//! Access tokens are HS256-signed JWTs carrying [`Claims`]. Secrets are stored
//! as SHA-256 hex digests produced by [`hash_secret`].

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use uuid::Uuid;

/// Errors raised while signing or reading a token
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Claims embedded in every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id
    pub sub: Uuid,
    /// The account's unique handle
    pub username: String,
    /// Issued-at time (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: Uuid, username: impl Into<String>, ttl_mins: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub,
            username: username.into(),
            iat: now,
            exp: now + ttl_mins * 60,
        }
    }
}

/// Token signing collaborator
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Lifetime of issued tokens, in minutes
    fn ttl_mins(&self) -> i64;

    /// Sign claims into a token
    async fn sign(&self, claims: &Claims) -> Result<String, AuthError>;

    /// Read claims without checking signature or expiry
    fn decode_unverified(&self, token: &str) -> Result<Claims, AuthError>;

    /// Read claims, checking signature and expiry
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 JWT issuer
#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_mins: i64,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, ttl_mins: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_mins,
        }
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    fn ttl_mins(&self) -> i64 {
        self.ttl_mins
    }

    async fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }

    fn decode_unverified(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?.claims)
    }
}

/// One-way, deterministic digest of a secret (SHA-256, lowercase hex)
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a candidate secret against a stored digest
pub fn verify_secret(candidate: &str, digest: &str) -> bool {
    let computed = hash_secret(candidate);
    // compare every byte so timing does not depend on the first mismatch
    computed.len() == digest.len()
        && computed
            .bytes()
            .zip(digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
