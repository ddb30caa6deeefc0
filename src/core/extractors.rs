//! Axum extractors for authenticated requests
//!
//! [`Caller`] reads the `Authorization: Bearer <token>` header and verifies
//! the token (signature and expiry) with the application's [`TokenIssuer`].

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::TokenIssuer;

/// Errors that can occur during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    MissingToken,
    InvalidToken,
}

impl std::fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorError::MissingToken => write!(f, "Missing bearer token"),
            ExtractorError::InvalidToken => write!(f, "Invalid or expired token"),
        }
    }
}

impl std::error::Error for ExtractorError {}

impl IntoResponse for ExtractorError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "code": "UNAUTHORIZED", "message": self.to_string() })),
        )
            .into_response()
    }
}

/// The account behind a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
}

impl Caller {
    /// Verify a raw `Authorization` header value
    pub fn from_header(
        header: Option<&str>,
        tokens: &dyn TokenIssuer,
    ) -> Result<Self, ExtractorError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ExtractorError::MissingToken)?;

        let claims = tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ExtractorError::InvalidToken
        })?;

        Ok(Self {
            id: claims.sub,
            username: claims.username,
        })
    }
}

impl<S> FromRequestParts<S> for Caller
where
    Arc<dyn TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ExtractorError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = <Arc<dyn TokenIssuer> as FromRef<S>>::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        Self::from_header(header, tokens.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{Claims, JwtTokenIssuer};

    #[tokio::test]
    async fn test_from_header() {
        let issuer = JwtTokenIssuer::new("extractor-test-secret", 5);
        let id = Uuid::new_v4();
        let token = issuer.sign(&Claims::new(id, "alice", 5)).await.unwrap();

        let caller = Caller::from_header(Some(&format!("Bearer {}", token)), &issuer).unwrap();
        assert_eq!(caller.id, id);
        assert_eq!(caller.username, "alice");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let issuer = JwtTokenIssuer::new("extractor-test-secret", 5);

        assert_eq!(
            Caller::from_header(None, &issuer),
            Err(ExtractorError::MissingToken)
        );
        assert_eq!(
            Caller::from_header(Some("Basic abc"), &issuer),
            Err(ExtractorError::MissingToken)
        );
        assert_eq!(
            Caller::from_header(Some("Bearer not.a.token"), &issuer),
            Err(ExtractorError::InvalidToken)
        );
    }
}
