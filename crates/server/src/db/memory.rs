//! In-memory [`CartStore`] used by the test suite.
//!
//! Mimics the document store's semantics: per-user quota counter kept in a
//! separate map, lazily repaired by counting cart documents, and atomic
//! create/delete sequences (trivially atomic under the single mutex). Exposes
//! failure-injection hooks so tests can exercise the repository's
//! degradation paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use tallycart_core::{
    CartDraft, CartId, CartPatch, CartStatus, ShoppingCart, UserId,
};

use super::RepositoryError;
use super::carts::CartStore;

#[derive(Debug)]
struct StoredCart {
    cart: ShoppingCart,
    /// Write sequence, used as a deterministic tie-break when timestamps
    /// collide within a test run.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    carts: HashMap<CartId, StoredCart>,
    counters: HashMap<UserId, u32>,
    seq: u64,
    fail_next_fetch_active: bool,
    fail_archive: HashSet<CartId>,
}

/// Mutex-guarded in-memory cart store.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    inner: Mutex<Inner>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cart document without touching the quota counter, as if it
    /// predated counter tracking.
    pub fn seed_cart_without_counter(&self, user_id: &UserId, name: &str) -> CartId {
        let mut inner = self.lock();
        let now = Utc::now();
        let id = CartId::generate();
        inner.seq += 1;
        let seq = inner.seq;
        inner.carts.insert(
            id.clone(),
            StoredCart {
                cart: ShoppingCart {
                    id: id.clone(),
                    name: name.to_owned(),
                    items: Vec::new(),
                    currency: None,
                    created_at: now,
                    updated_at: now,
                    user_id: user_id.clone(),
                    status: CartStatus::Active,
                },
                seq,
            },
        );
        id
    }

    /// Rewrite a cart's creation instant.
    pub fn backdate_cart(&self, cart_id: &CartId, created_at: DateTime<Utc>) {
        let mut inner = self.lock();
        if let Some(stored) = inner.carts.get_mut(cart_id) {
            stored.cart.created_at = created_at;
        }
    }

    /// Make the next `fetch_active` call fail once.
    pub fn fail_next_fetch_active(&self) {
        self.lock().fail_next_fetch_active = true;
    }

    /// Make every archive attempt for the given cart fail.
    pub fn fail_archive_of(&self, cart_id: &CartId) {
        self.lock().fail_archive.insert(cart_id.clone());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    fn sorted_for(&self, user_id: &UserId, status: Option<CartStatus>) -> Vec<ShoppingCart> {
        let inner = self.lock();
        let mut stored: Vec<(&StoredCart, u64)> = inner
            .carts
            .values()
            .filter(|s| &s.cart.user_id == user_id)
            .filter(|s| status.is_none_or(|wanted| s.cart.status == wanted))
            .map(|s| (s, s.seq))
            .collect();
        stored.sort_by(|a, b| {
            (b.0.cart.updated_at, b.1).cmp(&(a.0.cart.updated_at, a.1))
        });
        stored.into_iter().map(|(s, _)| s.cart.clone()).collect()
    }
}

impl CartStore for MemoryCartStore {
    async fn fetch_all(&self, user_id: &UserId) -> Result<Vec<ShoppingCart>, RepositoryError> {
        Ok(self.sorted_for(user_id, None))
    }

    async fn fetch_active(&self, user_id: &UserId) -> Result<Vec<ShoppingCart>, RepositoryError> {
        {
            let mut inner = self.lock();
            if inner.fail_next_fetch_active {
                inner.fail_next_fetch_active = false;
                return Err(RepositoryError::Unavailable(
                    "injected fetch_active failure".to_owned(),
                ));
            }
        }
        Ok(self.sorted_for(user_id, Some(CartStatus::Active)))
    }

    async fn fetch_one(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
    ) -> Result<Option<ShoppingCart>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .carts
            .get(cart_id)
            .filter(|s| &s.cart.user_id == user_id)
            .map(|s| s.cart.clone()))
    }

    async fn insert_with_quota(
        &self,
        user_id: &UserId,
        draft: CartDraft,
        max_carts: u32,
    ) -> Result<ShoppingCart, RepositoryError> {
        let mut inner = self.lock();

        // Counter repair: recompute from a full scan when never initialized.
        let count = match inner.counters.get(user_id) {
            Some(&count) => count,
            None => {
                let count = u32::try_from(
                    inner
                        .carts
                        .values()
                        .filter(|s| &s.cart.user_id == user_id)
                        .count(),
                )
                .unwrap_or(u32::MAX);
                inner.counters.insert(user_id.clone(), count);
                count
            }
        };

        if count >= max_carts {
            return Err(RepositoryError::CartLimit { max: max_carts });
        }

        let now = Utc::now();
        let cart = ShoppingCart {
            id: CartId::generate(),
            name: draft.name,
            items: draft.items,
            currency: draft.currency,
            created_at: now,
            updated_at: now,
            user_id: user_id.clone(),
            status: CartStatus::Active,
        };

        inner.seq += 1;
        let seq = inner.seq;
        inner.carts.insert(
            cart.id.clone(),
            StoredCart {
                cart: cart.clone(),
                seq,
            },
        );
        inner.counters.insert(user_id.clone(), count + 1);

        Ok(cart)
    }

    async fn apply_patch(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        patch: CartPatch,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        inner.seq += 1;
        let seq = inner.seq;

        let stored = inner
            .carts
            .get_mut(cart_id)
            .filter(|s| &s.cart.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = patch.name {
            stored.cart.name = name;
        }
        if let Some(items) = patch.items {
            stored.cart.items = items;
        }
        if let Some(currency) = patch.currency {
            stored.cart.currency = Some(currency);
        }
        stored.cart.updated_at = Utc::now();
        stored.seq = seq;

        Ok(())
    }

    async fn remove(&self, user_id: &UserId, cart_id: &CartId) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        let owned = inner
            .carts
            .get(cart_id)
            .is_some_and(|s| &s.cart.user_id == user_id);
        if !owned {
            // Idempotent no-op: the cart no longer exists (or belongs to
            // someone else), so neither effect is applied.
            return Ok(());
        }

        inner.carts.remove(cart_id);
        let count = inner.counters.entry(user_id.clone()).or_insert(0);
        *count = count.saturating_sub(1);

        Ok(())
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        status: CartStatus,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();

        if inner.fail_archive.contains(cart_id) {
            return Err(RepositoryError::Unavailable(
                "injected archive failure".to_owned(),
            ));
        }

        inner.seq += 1;
        let seq = inner.seq;
        let stored = inner
            .carts
            .get_mut(cart_id)
            .filter(|s| &s.cart.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        stored.cart.status = status;
        stored.cart.updated_at = Utc::now();
        stored.seq = seq;

        Ok(())
    }

    async fn cart_count(&self, user_id: &UserId) -> Result<u32, RepositoryError> {
        let inner = self.lock();
        match inner.counters.get(user_id) {
            Some(&count) => Ok(count),
            None => Ok(u32::try_from(
                inner
                    .carts
                    .values()
                    .filter(|s| &s.cart.user_id == user_id)
                    .count(),
            )
            .unwrap_or(u32::MAX)),
        }
    }
}
