//! Shopping carts.
//!
//! A cart is owned by exactly one user and is either `active` (the cart
//! currently being added to) or `archived` (finalized, kept for history).
//! At most one cart per user is intended to be active on a given calendar
//! day; that invariant is maintained opportunistically by the repository,
//! not by these types.

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, UserId};
use super::item::ShoppingItem;

/// Cart lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    #[default]
    Active,
    Archived,
}

/// A named, persisted shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCart {
    pub id: CartId,
    pub name: String,
    pub items: Vec<ShoppingItem>,
    /// ISO 4217 currency code the cart was priced in.
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: UserId,
    pub status: CartStatus,
}

impl ShoppingCart {
    /// Sum of item totals.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(|item| item.total).sum()
    }

    /// Sum of item quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Whether the cart was created on the given local calendar day.
    ///
    /// The creation instant is the cart's day identity; it is converted to
    /// the local timezone before comparing dates.
    #[must_use]
    pub fn created_on_local(&self, day: NaiveDate) -> bool {
        self.created_at.with_timezone(&Local).date_naive() == day
    }
}

/// Input for creating a new cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDraft {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingItem>,
    pub currency: Option<String>,
}

/// Partial update to a cart; only the supplied fields are merged.
///
/// `updated_at` is always refreshed to server time by the store, whether or
/// not any field is present here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPatch {
    pub name: Option<String>,
    pub items: Option<Vec<ShoppingItem>>,
    pub currency: Option<String>,
}

impl CartPatch {
    /// A patch that replaces only the item list.
    #[must_use]
    pub fn items(items: Vec<ShoppingItem>) -> Self {
        Self {
            items: Some(items),
            ..Self::default()
        }
    }

    /// A patch that renames the cart.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cart_with_items(items: Vec<ShoppingItem>) -> ShoppingCart {
        ShoppingCart {
            id: CartId::generate(),
            name: "My Cart #001".to_owned(),
            items,
            currency: Some("USD".to_owned()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_id: UserId::new("user_1"),
            status: CartStatus::Active,
        }
    }

    #[test]
    fn totals_sum_items() {
        let items = vec![
            ShoppingItem::new("Milk", Decimal::from(3), 2).unwrap(),
            ShoppingItem::new("Bread", Decimal::from(5), 1).unwrap(),
        ];
        let cart = cart_with_items(items);
        assert_eq!(cart.total_amount(), Decimal::from(11));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let cart = cart_with_items(Vec::new());
        assert_eq!(cart.total_amount(), Decimal::ZERO);
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn created_on_local_compares_calendar_days() {
        let mut cart = cart_with_items(Vec::new());
        let today = Local::now().date_naive();

        assert!(cart.created_on_local(today));

        // Anchor yesterday's cart at local noon so the UTC conversion cannot
        // shift it across a day boundary.
        let yesterday = today.pred_opt().unwrap();
        let noon = yesterday.and_hms_opt(12, 0, 0).unwrap();
        cart.created_at = Local
            .from_local_datetime(&noon)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        assert!(!cart.created_on_local(today));
        assert!(cart.created_on_local(yesterday));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CartStatus::Archived).unwrap(),
            "\"archived\""
        );
        assert_eq!(
            serde_json::from_str::<CartStatus>("\"active\"").unwrap(),
            CartStatus::Active
        );
    }
}
