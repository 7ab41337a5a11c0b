//! IP geolocation for currency detection.
//!
//! Looks up the caller's country and currency from an external geolocation
//! API. Results are cached per IP so repeated sign-ins do not hammer the
//! upstream service. Detection is best-effort; callers fall back to the
//! configured default currency when it fails.

use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during a geolocation lookup.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("geolocation API returned {status}")]
    Api { status: u16 },

    /// The response did not carry a usable country/currency pair.
    #[error("geolocation response incomplete")]
    Incomplete,

    /// A concurrent lookup for the same IP failed.
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

/// A resolved location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub country_code: String,
    pub currency: String,
}

/// Geolocation API client with a per-IP cache.
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, Location>,
}

const CACHE_CAPACITY: u64 = 10_000;
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

impl GeoClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Resolve a location for the given client IP.
    ///
    /// Without an IP the upstream service resolves the caller of the request
    /// itself, which is only useful in development.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] when the upstream lookup fails or returns an
    /// incomplete record.
    pub async fn lookup(&self, client_ip: Option<&str>) -> Result<Location, GeoError> {
        let key = client_ip.unwrap_or("origin").to_owned();
        let fetch = self.fetch(client_ip);
        self.cache
            .try_get_with(key, fetch)
            .await
            .map_err(|error| GeoError::Unavailable(error.to_string()))
    }

    async fn fetch(&self, client_ip: Option<&str>) -> Result<Location, GeoError> {
        let url = match client_ip {
            Some(ip) => format!("{}/{ip}/json/", self.base_url),
            None => format!("{}/json/", self.base_url),
        };

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Api {
                status: status.as_u16(),
            });
        }

        #[derive(Deserialize)]
        struct Raw {
            country_code: Option<String>,
            currency: Option<String>,
        }

        let raw: Raw = response.json().await?;
        match (raw.country_code, raw.currency) {
            (Some(country_code), Some(currency)) if !currency.is_empty() => Ok(Location {
                country_code,
                currency,
            }),
            _ => Err(GeoError::Incomplete),
        }
    }
}
