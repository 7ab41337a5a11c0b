//! Database operations for the Tallycart `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `users` - Per-user quota counter (`cart_count`), keyed by the identity
//!   provider's user ID
//! - `carts` - Persisted shopping carts, items stored as JSONB
//! - `session` - Tower-sessions storage
//!
//! The schema deliberately mirrors a document store: carts are addressed by
//! generated string IDs, tagged with `user_id`, and the only multi-row
//! atomicity used is the transaction around the quota counter and a single
//! cart row. No cross-row uniqueness constraint exists for "one active cart
//! per day"; that invariant is approximated by the repository's archive
//! sweep.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tallycart-cli -- migrate
//! ```

pub mod carts;
pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use carts::{CartRepository, CartStore};
pub use postgres::PgCartStore;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The user's cart quota is exhausted.
    #[error("cart limit reached ({max} carts)")]
    CartLimit { max: u32 },

    /// The backing store is temporarily unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
