//! Cart repository: durable CRUD for carts scoped to a user, with quota
//! enforcement and active-cart uniqueness.
//!
//! The repository is generic over a [`CartStore`], the seam to the underlying
//! document storage. The store provides per-document reads/writes and the two
//! transactional sequences (create-with-quota, delete-with-decrement); the
//! repository layers on the date-matching, failure-degradation, and
//! best-effort sweep semantics.
//!
//! # One active cart per day
//!
//! The store offers document-level transactions, not cross-document
//! uniqueness constraints over a derived predicate (status=active AND
//! date=today), so the invariant is maintained by convention: every create is
//! followed by [`CartRepository::archive_other_active`], a best-effort sweep
//! that tolerates a race window where two carts are briefly both active.

use std::future::Future;

use chrono::{Local, NaiveDate};
use futures::future::join_all;

use tallycart_core::{CartDraft, CartId, CartPatch, CartStatus, ShoppingCart, UserId};

use super::RepositoryError;

/// Storage seam for cart documents and the per-user quota counter.
///
/// Implementations must keep `insert_with_quota` and `remove` atomic: the
/// cart write and the counter change commit together or not at all.
pub trait CartStore: Send + Sync {
    /// All carts for the user, most recently updated first.
    fn fetch_all(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<ShoppingCart>, RepositoryError>> + Send;

    /// Active carts for the user, most recently updated first.
    fn fetch_active(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<ShoppingCart>, RepositoryError>> + Send;

    /// A single cart by ID, or `None` if it does not exist.
    fn fetch_one(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<ShoppingCart>, RepositoryError>> + Send;

    /// Atomically create a cart: read the quota counter (repairing an
    /// uninitialized counter by counting the user's existing carts), reject
    /// with [`RepositoryError::CartLimit`] when `cart_count >= max_carts`,
    /// insert the cart with status=active and server timestamps, and
    /// increment the counter.
    fn insert_with_quota(
        &self,
        user_id: &UserId,
        draft: CartDraft,
        max_carts: u32,
    ) -> impl Future<Output = Result<ShoppingCart, RepositoryError>> + Send;

    /// Merge only the supplied fields into a cart, always refreshing
    /// `updated_at` to server time. Missing cart is `NotFound`.
    fn apply_patch(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        patch: CartPatch,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically delete a cart and decrement the counter (floored at zero).
    /// A missing cart is an idempotent no-op: no effects, no error.
    fn remove(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Set a cart's status, refreshing `updated_at`. Missing cart is
    /// `NotFound`.
    fn set_status(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        status: CartStatus,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// The quota counter, falling back to a count of cart documents when the
    /// counter was never initialized.
    fn cart_count(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<u32, RepositoryError>> + Send;
}

/// Repository for cart operations.
#[derive(Debug, Clone)]
pub struct CartRepository<S> {
    store: S,
}

impl<S: CartStore> CartRepository<S> {
    /// Create a new cart repository over a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// All carts for the user, sorted by last update descending. An empty
    /// result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the underlying query fails.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<ShoppingCart>, RepositoryError> {
        self.store.fetch_all(user_id).await
    }

    /// Active carts for the user, same ordering as [`Self::list`].
    ///
    /// Failure of the underlying query is swallowed and reported as an empty
    /// sequence; callers must treat "no active carts" and "query failed"
    /// identically.
    pub async fn list_active(&self, user_id: &UserId) -> Vec<ShoppingCart> {
        match self.store.fetch_active(user_id).await {
            Ok(carts) => carts,
            Err(error) => {
                tracing::error!(user_id = %user_id, %error, "failed to list active carts");
                Vec::new()
            }
        }
    }

    /// The user's active cart for today (local calendar date).
    ///
    /// If multiple active carts were created today, the most recently
    /// updated one wins (the active list is already sorted that way); no
    /// additional tie-break is applied. Returns `None` when no active cart's
    /// creation date matches today, even if active carts from other days
    /// exist.
    pub async fn todays_active(&self, user_id: &UserId) -> Option<ShoppingCart> {
        self.active_on(user_id, Local::now().date_naive()).await
    }

    /// [`Self::todays_active`] for an explicit local calendar day.
    pub async fn active_on(&self, user_id: &UserId, day: NaiveDate) -> Option<ShoppingCart> {
        self.list_active(user_id)
            .await
            .into_iter()
            .find(|cart| cart.created_on_local(day))
    }

    /// A single cart by ID. Absence is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the underlying query fails.
    pub async fn get(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
    ) -> Result<Option<ShoppingCart>, RepositoryError> {
        self.store.fetch_one(user_id, cart_id).await
    }

    /// Create a cart with status=active, enforcing the per-user quota.
    ///
    /// The quota check, cart insert, and counter increment happen inside one
    /// store transaction: both effects commit together or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::CartLimit`] when the user already holds
    /// `max_carts` carts; state is left unchanged in that case.
    pub async fn create(
        &self,
        user_id: &UserId,
        draft: CartDraft,
        max_carts: u32,
    ) -> Result<ShoppingCart, RepositoryError> {
        self.store.insert_with_quota(user_id, draft, max_carts).await
    }

    /// Merge the supplied fields into a cart, refreshing `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the cart does not exist.
    pub async fn update(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        patch: CartPatch,
    ) -> Result<(), RepositoryError> {
        self.store.apply_patch(user_id, cart_id, patch).await
    }

    /// Delete a cart and decrement the quota counter. Deleting a cart that
    /// no longer exists is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the underlying transaction fails.
    pub async fn delete(&self, user_id: &UserId, cart_id: &CartId) -> Result<(), RepositoryError> {
        self.store.remove(user_id, cart_id).await
    }

    /// Archive a cart explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the cart does not exist.
    pub async fn archive(&self, user_id: &UserId, cart_id: &CartId) -> Result<(), RepositoryError> {
        self.store
            .set_status(user_id, cart_id, CartStatus::Archived)
            .await
    }

    /// Best-effort sweep: archive every active cart except `keep`.
    ///
    /// The archive operations run concurrently and independently; a failure
    /// of one does not roll back or stop the others, and nothing is surfaced
    /// to the caller (failures are logged only). Invoked after every create
    /// to approximate the one-active-cart-per-day invariant; self-heals on
    /// the next invocation.
    pub async fn archive_other_active(&self, user_id: &UserId, keep: Option<&CartId>) {
        let active = self.list_active(user_id).await;

        let sweeps = active
            .iter()
            .filter(|cart| Some(&cart.id) != keep)
            .map(|cart| async move {
                if let Err(error) = self
                    .store
                    .set_status(user_id, &cart.id, CartStatus::Archived)
                    .await
                {
                    tracing::warn!(
                        user_id = %user_id,
                        cart_id = %cart.id,
                        %error,
                        "failed to archive cart during sweep"
                    );
                }
            });

        join_all(sweeps).await;
    }

    /// The user's quota counter.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the underlying query fails.
    pub async fn cart_count(&self, user_id: &UserId) -> Result<u32, RepositoryError> {
        self.store.cart_count(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use tallycart_core::ShoppingItem;

    use super::super::memory::MemoryCartStore;
    use super::*;

    fn repo() -> CartRepository<MemoryCartStore> {
        CartRepository::new(MemoryCartStore::new())
    }

    fn user() -> UserId {
        UserId::new("user_1")
    }

    fn draft(name: &str) -> CartDraft {
        CartDraft {
            name: name.to_owned(),
            items: Vec::new(),
            currency: Some("USD".to_owned()),
        }
    }

    #[tokio::test]
    async fn create_increments_counter_by_one() {
        let repo = repo();
        let user = user();

        assert_eq!(repo.cart_count(&user).await.unwrap(), 0);
        repo.create(&user, draft("My Cart #001"), 12).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 1);
        repo.create(&user, draft("My Cart #002"), 12).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn create_rejects_at_quota_and_leaves_state_unchanged() {
        let repo = repo();
        let user = user();

        let a = repo.create(&user, draft("A"), 2).await.unwrap();
        let b = repo.create(&user, draft("B"), 2).await.unwrap();
        assert_ne!(a.id, b.id);

        let err = repo.create(&user, draft("C"), 2).await.unwrap_err();
        assert!(matches!(err, RepositoryError::CartLimit { max: 2 }));
        assert_eq!(repo.cart_count(&user).await.unwrap(), 2);
        assert_eq!(repo.list(&user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn counter_repair_counts_existing_carts() {
        let store = MemoryCartStore::new();
        let user = user();

        // Carts that predate counter tracking: documents exist but the user
        // counter was never written.
        store.seed_cart_without_counter(&user, "legacy 1");
        store.seed_cart_without_counter(&user, "legacy 2");

        let repo = CartRepository::new(store);
        assert_eq!(repo.cart_count(&user).await.unwrap(), 2);

        repo.create(&user, draft("fresh"), 12).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 3);

        // Repair also applies to the limit check.
        let err = repo.create(&user, draft("over"), 3).await.unwrap_err();
        assert!(matches!(err, RepositoryError::CartLimit { max: 3 }));
    }

    #[tokio::test]
    async fn delete_decrements_and_is_idempotent() {
        let repo = repo();
        let user = user();

        let cart = repo.create(&user, draft("A"), 12).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 1);

        repo.delete(&user, &cart.id).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 0);
        assert!(repo.get(&user, &cart.id).await.unwrap().is_none());

        // Second delete: counter unchanged, no error.
        repo.delete(&user, &cart.id).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_floors_counter_at_zero() {
        let store = MemoryCartStore::new();
        let user = user();
        store.seed_cart_without_counter(&user, "legacy");
        let repo = CartRepository::new(store);

        let cart = repo.list(&user).await.unwrap().remove(0);
        repo.delete(&user, &cart.id).await.unwrap();
        repo.delete(&user, &cart.id).await.unwrap();
        assert_eq!(repo.cart_count(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_missing_cart_is_none_not_error() {
        let repo = repo();
        let user = user();
        let missing = CartId::new("nope");
        assert!(repo.get(&user, &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_active_swallows_store_failure() {
        let store = MemoryCartStore::new();
        let user = user();
        let repo = CartRepository::new(store);
        repo.create(&user, draft("A"), 12).await.unwrap();

        assert_eq!(repo.list_active(&user).await.len(), 1);

        repo.store.fail_next_fetch_active();
        assert!(repo.list_active(&user).await.is_empty());

        // Self-heals afterwards.
        assert_eq!(repo.list_active(&user).await.len(), 1);
    }

    #[tokio::test]
    async fn todays_active_ignores_other_days() {
        let store = MemoryCartStore::new();
        let user = user();
        let repo = CartRepository::new(store);

        let old = repo.create(&user, draft("yesterday"), 12).await.unwrap();
        repo.store
            .backdate_cart(&old.id, Utc::now() - Duration::days(1));

        assert!(repo.todays_active(&user).await.is_none());

        let fresh = repo.create(&user, draft("today"), 12).await.unwrap();
        let found = repo.todays_active(&user).await.unwrap();
        assert_eq!(found.id, fresh.id);
    }

    #[tokio::test]
    async fn todays_active_prefers_most_recently_updated() {
        let repo = repo();
        let user = user();

        let first = repo.create(&user, draft("first"), 12).await.unwrap();
        let second = repo.create(&user, draft("second"), 12).await.unwrap();

        // Touch the first cart so it becomes the most recently updated.
        repo.update(&user, &first.id, CartPatch::rename("first touched"))
            .await
            .unwrap();

        let found = repo.todays_active(&user).await.unwrap();
        assert_eq!(found.id, first.id);
        assert_ne!(found.id, second.id);
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let repo = repo();
        let user = user();

        let cart = repo
            .create(&user, draft("original"), 12)
            .await
            .unwrap();

        let items = vec![ShoppingItem::new("Milk", Decimal::from(3), 2).unwrap()];
        repo.update(&user, &cart.id, CartPatch::items(items.clone()))
            .await
            .unwrap();

        let stored = repo.get(&user, &cart.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "original");
        assert_eq!(stored.currency.as_deref(), Some("USD"));
        assert_eq!(stored.items, items);
        assert!(stored.updated_at >= cart.updated_at);
    }

    #[tokio::test]
    async fn update_missing_cart_is_not_found() {
        let repo = repo();
        let user = user();
        let err = repo
            .update(&user, &CartId::new("nope"), CartPatch::rename("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn sweep_archives_all_but_kept() {
        let repo = repo();
        let user = user();

        let a = repo.create(&user, draft("A"), 12).await.unwrap();
        let b = repo.create(&user, draft("B"), 12).await.unwrap();
        let c = repo.create(&user, draft("C"), 12).await.unwrap();

        repo.archive_other_active(&user, Some(&b.id)).await;

        let active = repo.list_active(&user).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|cart| cart.id.clone()), Some(b.id));

        for id in [&a.id, &c.id] {
            let cart = repo.get(&user, id).await.unwrap().unwrap();
            assert_eq!(cart.status, CartStatus::Archived);
        }
    }

    #[tokio::test]
    async fn sweep_partial_failure_archives_the_rest() {
        let repo = repo();
        let user = user();

        let a = repo.create(&user, draft("A"), 12).await.unwrap();
        let b = repo.create(&user, draft("B"), 12).await.unwrap();
        let c = repo.create(&user, draft("C"), 12).await.unwrap();

        // Archiving A will fail; C must still be archived and B kept active.
        repo.store.fail_archive_of(&a.id);
        repo.archive_other_active(&user, Some(&b.id)).await;

        assert_eq!(
            repo.get(&user, &a.id).await.unwrap().unwrap().status,
            CartStatus::Active
        );
        assert_eq!(
            repo.get(&user, &b.id).await.unwrap().unwrap().status,
            CartStatus::Active
        );
        assert_eq!(
            repo.get(&user, &c.id).await.unwrap().unwrap().status,
            CartStatus::Archived
        );
    }

    #[tokio::test]
    async fn carts_are_scoped_to_their_owner() {
        let repo = repo();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        let cart = repo.create(&alice, draft("A"), 12).await.unwrap();

        assert!(repo.get(&bob, &cart.id).await.unwrap().is_none());
        assert!(repo.list(&bob).await.unwrap().is_empty());

        // Deleting through the wrong user is a no-op.
        repo.delete(&bob, &cart.id).await.unwrap();
        assert!(repo.get(&alice, &cart.id).await.unwrap().is_some());
        assert_eq!(repo.cart_count(&alice).await.unwrap(), 1);
    }
}
