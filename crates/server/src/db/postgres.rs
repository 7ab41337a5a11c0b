//! `PostgreSQL` implementation of the cart store.
//!
//! Carts are stored as rows with the item list in a JSONB column, so a cart
//! behaves like a single document: every write touches one row, and the only
//! multi-row transactions are the quota sequences (create-with-increment,
//! delete-with-decrement). Timestamps are always assigned by the database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tallycart_core::{
    CartDraft, CartId, CartPatch, CartStatus, ShoppingCart, ShoppingItem, UserId,
};

use super::RepositoryError;
use super::carts::CartStore;

/// Cart store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: String,
    user_id: String,
    name: String,
    currency: Option<String>,
    status: String,
    items: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self) -> Result<ShoppingCart, RepositoryError> {
        let items: Vec<ShoppingItem> = serde_json::from_value(self.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid item list in database: {e}"))
        })?;

        Ok(ShoppingCart {
            id: CartId::new(self.id),
            name: self.name,
            items,
            currency: self.currency,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user_id: UserId::new(self.user_id),
            // Forgiving parse: anything unexpected is treated as active.
            status: if self.status == "archived" {
                CartStatus::Archived
            } else {
                CartStatus::Active
            },
        })
    }
}

const fn status_str(status: CartStatus) -> &'static str {
    match status {
        CartStatus::Active => "active",
        CartStatus::Archived => "archived",
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, name, currency, status, items, created_at, updated_at";

impl CartStore for PgCartStore {
    async fn fetch_all(&self, user_id: &UserId) -> Result<Vec<ShoppingCart>, RepositoryError> {
        let rows: Vec<CartRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM carts WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartRow::into_cart).collect()
    }

    async fn fetch_active(&self, user_id: &UserId) -> Result<Vec<ShoppingCart>, RepositoryError> {
        let rows: Vec<CartRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM carts \
             WHERE user_id = $1 AND status = 'active' \
             ORDER BY updated_at DESC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartRow::into_cart).collect()
    }

    async fn fetch_one(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
    ) -> Result<Option<ShoppingCart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM carts WHERE id = $1 AND user_id = $2"
        ))
        .bind(cart_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartRow::into_cart).transpose()
    }

    async fn insert_with_quota(
        &self,
        user_id: &UserId,
        draft: CartDraft,
        max_carts: u32,
    ) -> Result<ShoppingCart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the counter row for the read-check-write sequence. A missing
        // row means the counter was never initialized; repair it from a full
        // scan before checking the limit.
        let count: Option<i64> =
            sqlx::query_scalar("SELECT cart_count FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        let count = match count {
            Some(count) => count,
            None => {
                let count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = $1")
                        .bind(user_id.as_str())
                        .fetch_one(&mut *tx)
                        .await?;

                sqlx::query(
                    "INSERT INTO users (id, cart_count) VALUES ($1, $2) \
                     ON CONFLICT (id) DO UPDATE SET cart_count = EXCLUDED.cart_count",
                )
                .bind(user_id.as_str())
                .bind(count)
                .execute(&mut *tx)
                .await?;

                count
            }
        };

        if count >= i64::from(max_carts) {
            // Dropping the transaction rolls back the counter repair too;
            // the next create repairs it again.
            return Err(RepositoryError::CartLimit { max: max_carts });
        }

        let items = serde_json::to_value(&draft.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize items: {e}"))
        })?;

        let row: CartRow = sqlx::query_as(&format!(
            "INSERT INTO carts (id, user_id, name, currency, status, items) \
             VALUES ($1, $2, $3, $4, 'active', $5) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(CartId::generate().as_str())
        .bind(user_id.as_str())
        .bind(&draft.name)
        .bind(&draft.currency)
        .bind(items)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET cart_count = cart_count + 1 WHERE id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_cart()
    }

    async fn apply_patch(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        patch: CartPatch,
    ) -> Result<(), RepositoryError> {
        let items = patch
            .items
            .map(|items| serde_json::to_value(&items))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("failed to serialize items: {e}"))
            })?;

        let result = sqlx::query(
            "UPDATE carts SET \
               name = COALESCE($3, name), \
               items = COALESCE($4, items), \
               currency = COALESCE($5, currency), \
               updated_at = now() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(cart_id.as_str())
        .bind(user_id.as_str())
        .bind(patch.name)
        .bind(items)
        .bind(patch.currency)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn remove(&self, user_id: &UserId, cart_id: &CartId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM carts WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(cart_id.as_str())
                .bind(user_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        // Idempotent no-op: skip both effects when the cart no longer exists.
        if exists.is_none() {
            return Ok(());
        }

        sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
            .bind(cart_id.as_str())
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET cart_count = GREATEST(cart_count - 1, 0) WHERE id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        status: CartStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE carts SET status = $3, updated_at = now() WHERE id = $1 AND user_id = $2",
        )
        .bind(cart_id.as_str())
        .bind(user_id.as_str())
        .bind(status_str(status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn cart_count(&self, user_id: &UserId) -> Result<u32, RepositoryError> {
        let count: Option<i64> = sqlx::query_scalar("SELECT cart_count FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let count = match count {
            Some(count) => count,
            // Counter never initialized: fall back to counting documents.
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = $1")
                    .bind(user_id.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(u32::try_from(count).unwrap_or(0))
    }
}
