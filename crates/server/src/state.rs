//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::carts::CartRepository;
use crate::db::postgres::PgCartStore;
use crate::identity::{IdentityClient, IdentityError};
use crate::services::{GeoClient, ProfileSync};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the database pool, repositories and
/// external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    carts: CartRepository<PgCartStore>,
    identity: IdentityClient,
    profile_sync: ProfileSync,
    geo: GeoClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity-provider client fails to build.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, IdentityError> {
        let identity = IdentityClient::new(&config.identity)?;
        let profile_sync = ProfileSync::new(identity.clone(), config.default_currency.clone());
        let geo = GeoClient::new(&config.geo_base_url);
        let carts = CartRepository::new(PgCartStore::new(pool.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                identity,
                profile_sync,
                geo,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cart repository.
    #[must_use]
    pub fn carts(&self) -> &CartRepository<PgCartStore> {
        &self.inner.carts
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the profile sync service.
    #[must_use]
    pub fn profile_sync(&self) -> &ProfileSync {
        &self.inner.profile_sync
    }

    /// Get a reference to the geolocation client.
    #[must_use]
    pub fn geo(&self) -> &GeoClient {
        &self.inner.geo
    }
}
