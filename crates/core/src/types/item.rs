//! Shopping list items.
//!
//! An item's `total` is always `price * quantity`. The only ways to build or
//! change an item go through [`ShoppingItem::new`] and
//! [`ShoppingItem::apply`], both of which recompute the total, so the
//! invariant cannot drift.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ItemId;

/// Validation errors for item input.
///
/// These are checked before any persistence attempt and block the operation
/// entirely; they surface to the UI as user-facing messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    /// The product name is empty or whitespace-only.
    #[error("product name is required")]
    EmptyName,

    /// The price is zero or negative.
    #[error("price must be positive")]
    NonPositivePrice,

    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The referenced item does not exist in the list.
    #[error("item not found")]
    NotFound,
}

/// A single priced entry on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    /// Always `price * quantity`; recomputed on every edit.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ShoppingItem {
    /// Create a new item with a freshly generated ID.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the name is empty, the price is not
    /// positive, or the quantity is zero.
    pub fn new(name: &str, price: Decimal, quantity: u32) -> Result<Self, ItemError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ItemError::EmptyName);
        }
        if price <= Decimal::ZERO {
            return Err(ItemError::NonPositivePrice);
        }
        if quantity == 0 {
            return Err(ItemError::ZeroQuantity);
        }

        Ok(Self {
            id: ItemId::generate(),
            name: name.to_owned(),
            quantity,
            price,
            total: price * Decimal::from(quantity),
            created_at: Utc::now(),
        })
    }

    /// Apply a partial update, recomputing the total.
    ///
    /// Name, price, and quantity change together with the total; the ID and
    /// creation time are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the patched fields are invalid.
    pub fn apply(&self, patch: &ItemPatch) -> Result<Self, ItemError> {
        let name = patch.name.as_deref().unwrap_or(&self.name).trim();
        if name.is_empty() {
            return Err(ItemError::EmptyName);
        }

        let price = patch.price.unwrap_or(self.price);
        if price <= Decimal::ZERO {
            return Err(ItemError::NonPositivePrice);
        }

        let quantity = patch.quantity.unwrap_or(self.quantity);
        if quantity == 0 {
            return Err(ItemError::ZeroQuantity);
        }

        Ok(Self {
            id: self.id.clone(),
            name: name.to_owned(),
            quantity,
            price,
            total: price * Decimal::from(quantity),
            created_at: self.created_at,
        })
    }
}

/// Partial update to an item; only the supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
}
