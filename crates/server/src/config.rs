//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TALLYCART_DATABASE_URL` - `PostgreSQL` connection string
//! - `TALLYCART_SESSION_SECRET` - Session signing secret (min 32 chars)
//! - `IDENTITY_BASE_URL` - Identity provider API base URL
//! - `IDENTITY_SECRET_KEY` - Identity provider server-side secret key
//!
//! ## Optional
//! - `TALLYCART_HOST` - Bind address (default: 127.0.0.1)
//! - `TALLYCART_PORT` - Listen port (default: 3000)
//! - `TALLYCART_BASE_URL` - Public base URL, used for the secure-cookie flag
//!   (default: `http://127.0.0.1:3000`)
//! - `TALLYCART_MAX_CARTS` - Per-user cart quota (default: 12)
//! - `TALLYCART_DEFAULT_CURRENCY` - Seed currency when detection fails (default: INR)
//! - `GEO_BASE_URL` - IP geolocation service base URL (default: https://ipapi.co)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Default per-user cart quota.
pub const DEFAULT_MAX_CARTS: u32 = 12;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL the app is served from
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Maximum number of carts a user may keep
    pub max_carts: u32,
    /// Currency seeded when geolocation detection is unavailable
    pub default_currency: String,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// IP geolocation service base URL
    pub geo_base_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Identity provider API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity provider API base URL
    pub base_url: String,
    /// Server-side secret key (grants access to server-only metadata)
    pub secret_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing, a value
    /// fails to parse, or the session secret is too weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(require("TALLYCART_DATABASE_URL")?);
        let session_secret = SecretString::from(require("TALLYCART_SESSION_SECRET")?);
        validate_secret("TALLYCART_SESSION_SECRET", &session_secret)?;

        let host = optional("TALLYCART_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TALLYCART_HOST".to_owned(), e.to_string()))?;

        let port = optional("TALLYCART_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TALLYCART_PORT".to_owned(), e.to_string()))?;

        let base_url = optional("TALLYCART_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:3000".to_owned());

        let max_carts = match optional("TALLYCART_MAX_CARTS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidEnvVar("TALLYCART_MAX_CARTS".to_owned(), e.to_string())
            })?,
            None => DEFAULT_MAX_CARTS,
        };

        let default_currency =
            optional("TALLYCART_DEFAULT_CURRENCY").unwrap_or_else(|| "INR".to_owned());

        let identity = IdentityConfig {
            base_url: require("IDENTITY_BASE_URL")?,
            secret_key: SecretString::from(require("IDENTITY_SECRET_KEY")?),
        };

        let geo_base_url =
            optional("GEO_BASE_URL").unwrap_or_else(|| "https://ipapi.co".to_owned());

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            max_carts,
            default_currency,
            identity,
            geo_base_url,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Socket address to bind the listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn validate_secret(name: &str, secret: &SecretString) -> Result<(), ConfigError> {
    if secret.expose_secret().len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }
    Ok(())
}
