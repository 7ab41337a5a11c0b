//! Identity provider API client.
//!
//! The identity provider owns authentication and per-user metadata. It is
//! consumed as an opaque service; the server depends only on session
//! verification and the two metadata scopes:
//!
//! - **profile metadata** - user-writable preferences (currency, theme)
//! - **private metadata** - server-only data (plan tier), never writable by
//!   untrusted client code; all writes go through this client with the
//!   server-side secret key

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use tallycart_core::UserId;

use crate::config::IdentityConfig;

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session token is invalid or expired.
    #[error("invalid session")]
    InvalidSession,

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A user record as returned by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// User-writable metadata scope.
    #[serde(default)]
    pub profile_metadata: Map<String, Value>,
    /// Server-only metadata scope.
    #[serde(default)]
    pub private_metadata: Map<String, Value>,
}

/// Claims extracted from a verified session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: String,
}

/// Identity provider API client.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| IdentityError::Parse(format!("Invalid secret key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Fetch a user record, including both metadata scopes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the request fails or the user does not
    /// exist.
    pub async fn get_user(&self, user_id: &UserId) -> Result<UserRecord, IdentityError> {
        let url = format!("{}/v1/users/{user_id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::parse_user(response).await
    }

    /// Replace the user-writable metadata scope.
    ///
    /// Callers merge into the existing map before writing so unrelated keys
    /// survive.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the request fails.
    pub async fn update_profile_metadata(
        &self,
        user_id: &UserId,
        metadata: &Map<String, Value>,
    ) -> Result<UserRecord, IdentityError> {
        self.patch_metadata(user_id, "profile_metadata", metadata)
            .await
    }

    /// Replace the server-only metadata scope.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the request fails.
    pub async fn update_private_metadata(
        &self,
        user_id: &UserId,
        metadata: &Map<String, Value>,
    ) -> Result<UserRecord, IdentityError> {
        self.patch_metadata(user_id, "private_metadata", metadata)
            .await
    }

    /// Verify a client-supplied session token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidSession`] when the token is rejected.
    pub async fn verify_session(&self, token: &str) -> Result<SessionClaims, IdentityError> {
        let url = format!("{}/v1/sessions/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            return Err(IdentityError::InvalidSession);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))
    }

    async fn patch_metadata(
        &self,
        user_id: &UserId,
        scope: &str,
        metadata: &Map<String, Value>,
    ) -> Result<UserRecord, IdentityError> {
        let url = format!("{}/v1/users/{user_id}/metadata", self.base_url);
        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ scope: metadata }))
            .send()
            .await?;
        Self::parse_user(response).await
    }

    async fn parse_user(response: reqwest::Response) -> Result<UserRecord, IdentityError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))
    }
}
