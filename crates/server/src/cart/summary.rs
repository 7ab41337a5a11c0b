//! Display aggregates derived from item and cart collections.

use rust_decimal::Decimal;
use serde::Serialize;

use tallycart_core::{ShoppingCart, ShoppingItem};

/// Running totals for a single item list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    /// Sum of item totals.
    pub total_amount: Decimal,
    /// Sum of item quantities.
    pub total_quantity: u64,
    /// Number of distinct items.
    pub total_items: usize,
}

impl ListSummary {
    /// Aggregate an item list.
    #[must_use]
    pub fn of(items: &[ShoppingItem]) -> Self {
        Self {
            total_amount: items.iter().map(|item| item.total).sum(),
            total_quantity: items.iter().map(|item| u64::from(item.quantity)).sum(),
            total_items: items.len(),
        }
    }
}

/// Aggregates for the carts overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartsOverview {
    pub cart_count: usize,
    /// Average of per-cart totals; zero when there are no carts.
    pub average_total: Decimal,
}

impl CartsOverview {
    /// Aggregate a cart collection.
    #[must_use]
    pub fn of(carts: &[ShoppingCart]) -> Self {
        let cart_count = carts.len();
        let average_total = if cart_count == 0 {
            Decimal::ZERO
        } else {
            let sum: Decimal = carts.iter().map(ShoppingCart::total_amount).sum();
            sum / Decimal::from(cart_count as u64)
        };

        Self {
            cart_count,
            average_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use tallycart_core::{CartId, CartStatus, UserId};

    use super::*;

    fn item(price: i64, quantity: u32) -> ShoppingItem {
        ShoppingItem::new("Thing", Decimal::from(price), quantity).unwrap()
    }

    fn cart(items: Vec<ShoppingItem>) -> ShoppingCart {
        ShoppingCart {
            id: CartId::generate(),
            name: "Cart".to_owned(),
            items,
            currency: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_id: UserId::new("u"),
            status: CartStatus::Active,
        }
    }

    #[test]
    fn summary_totals_match_price_times_quantity() {
        let items = vec![item(10, 3), item(5, 2)];
        let summary = ListSummary::of(&items);
        assert_eq!(summary.total_amount, Decimal::from(40));
        assert_eq!(summary.total_quantity, 5);
        assert_eq!(summary.total_items, 2);

        // The invariant holds item by item as well.
        for it in &items {
            assert_eq!(it.total, it.price * Decimal::from(it.quantity));
        }
    }

    #[test]
    fn summary_of_empty_list_is_zero() {
        let summary = ListSummary::of(&[]);
        assert_eq!(summary.total_amount, Decimal::ZERO);
        assert_eq!(summary.total_quantity, 0);
        assert_eq!(summary.total_items, 0);
    }

    #[test]
    fn overview_averages_cart_totals() {
        let carts = vec![
            cart(vec![item(10, 1)]),
            cart(vec![item(30, 1)]),
        ];
        let overview = CartsOverview::of(&carts);
        assert_eq!(overview.cart_count, 2);
        assert_eq!(overview.average_total, Decimal::from(20));
    }

    #[test]
    fn overview_of_no_carts_is_zero() {
        let overview = CartsOverview::of(&[]);
        assert_eq!(overview.cart_count, 0);
        assert_eq!(overview.average_total, Decimal::ZERO);
    }
}
