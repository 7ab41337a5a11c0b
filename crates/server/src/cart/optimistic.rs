//! Optimistic update contract for item lists.
//!
//! UI mutations apply to local state immediately; the full post-mutation
//! item list is then persisted as one unit. Each [`apply`] returns the new
//! state together with a [`Revert`] token capturing the pre-mutation item.
//! On persistence failure the caller runs [`rollback`] with that token and
//! propagates the failure; there is no partial-item rollback.

use tallycart_core::{ItemError, ItemId, ItemPatch, ShoppingItem};

/// Local item-list state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub items: Vec<ShoppingItem>,
}

impl ListState {
    #[must_use]
    pub fn new(items: Vec<ShoppingItem>) -> Self {
        Self { items }
    }
}

/// A single UI mutation.
#[derive(Debug, Clone)]
pub enum ListEvent {
    /// Prepend a new item.
    Add(ShoppingItem),
    /// Patch an existing item, recomputing its total.
    Update { id: ItemId, patch: ItemPatch },
    /// Remove an item.
    Delete { id: ItemId },
    /// Remove everything.
    Clear,
}

/// How to undo a mutation if persisting it fails.
#[derive(Debug, Clone)]
pub enum Revert {
    /// Drop an optimistically added item.
    Remove(ItemId),
    /// Put the captured pre-mutation item back (in place if its slot still
    /// exists, appended otherwise).
    Restore(ShoppingItem),
    /// Replace the whole list.
    RestoreAll(Vec<ShoppingItem>),
}

/// Result of applying an event: the post-mutation state plus the revert
/// token for the persistence-failure path.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: ListState,
    pub revert: Revert,
}

impl Outcome {
    /// The item list to persist; the whole list is the unit of persistence.
    #[must_use]
    pub fn persist(&self) -> &[ShoppingItem] {
        &self.state.items
    }
}

/// Apply a mutation to local state.
///
/// # Errors
///
/// Returns [`ItemError`] when the event's input fails validation or refers
/// to an item that is not in the list. Nothing is mutated in that case.
pub fn apply(state: &ListState, event: ListEvent) -> Result<Outcome, ItemError> {
    match event {
        ListEvent::Add(item) => {
            let mut items = Vec::with_capacity(state.items.len() + 1);
            let id = item.id.clone();
            items.push(item);
            items.extend(state.items.iter().cloned());
            Ok(Outcome {
                state: ListState::new(items),
                revert: Revert::Remove(id),
            })
        }
        ListEvent::Update { id, patch } => {
            let index = state
                .items
                .iter()
                .position(|item| item.id == id)
                .ok_or(ItemError::NotFound)?;

            let captured = state.items[index].clone();
            let updated = captured.apply(&patch)?;

            let mut items = state.items.clone();
            items[index] = updated;
            Ok(Outcome {
                state: ListState::new(items),
                revert: Revert::Restore(captured),
            })
        }
        ListEvent::Delete { id } => {
            let index = state
                .items
                .iter()
                .position(|item| item.id == id)
                .ok_or(ItemError::NotFound)?;

            let mut items = state.items.clone();
            let captured = items.remove(index);
            Ok(Outcome {
                state: ListState::new(items),
                revert: Revert::Restore(captured),
            })
        }
        ListEvent::Clear => Ok(Outcome {
            state: ListState::default(),
            revert: Revert::RestoreAll(state.items.clone()),
        }),
    }
}

/// Undo a failed mutation, restoring the captured pre-mutation item.
#[must_use]
pub fn rollback(state: ListState, revert: Revert) -> ListState {
    match revert {
        Revert::Remove(id) => {
            let mut items = state.items;
            items.retain(|item| item.id != id);
            ListState::new(items)
        }
        Revert::Restore(original) => {
            let mut items = state.items;
            match items.iter().position(|item| item.id == original.id) {
                Some(index) => items[index] = original,
                None => items.push(original),
            }
            ListState::new(items)
        }
        Revert::RestoreAll(items) => ListState::new(items),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn state_with(items: Vec<ShoppingItem>) -> ListState {
        ListState::new(items)
    }

    #[test]
    fn add_prepends_and_rollback_removes() {
        let existing = ShoppingItem::new("Old", Decimal::ONE, 1).unwrap();
        let state = state_with(vec![existing.clone()]);

        let new_item = ShoppingItem::new("New", Decimal::TWO, 1).unwrap();
        let outcome = apply(&state, ListEvent::Add(new_item.clone())).unwrap();

        assert_eq!(outcome.state.items.len(), 2);
        assert_eq!(outcome.state.items[0], new_item);

        let rolled = rollback(outcome.state, outcome.revert);
        assert_eq!(rolled.items, vec![existing]);
    }

    #[test]
    fn update_recomputes_total_and_rollback_restores_original() {
        // Price 10, quantity 3 -> total 30.
        let item = ShoppingItem::new("Rice", Decimal::from(10), 3).unwrap();
        let state = state_with(vec![item.clone()]);

        let outcome = apply(
            &state,
            ListEvent::Update {
                id: item.id.clone(),
                patch: ItemPatch {
                    price: Some(Decimal::from(15)),
                    ..ItemPatch::default()
                },
            },
        )
        .unwrap();

        // Optimistic state: price 15 x 3 = 45.
        assert_eq!(outcome.state.items[0].price, Decimal::from(15));
        assert_eq!(outcome.state.items[0].total, Decimal::from(45));

        // Persistence failed: the pre-edit item comes back whole.
        let rolled = rollback(outcome.state, outcome.revert);
        assert_eq!(rolled.items[0].price, Decimal::from(10));
        assert_eq!(rolled.items[0].total, Decimal::from(30));
        assert_eq!(rolled.items[0], item);
    }

    #[test]
    fn delete_and_rollback_round_trip() {
        let a = ShoppingItem::new("A", Decimal::ONE, 1).unwrap();
        let b = ShoppingItem::new("B", Decimal::TWO, 1).unwrap();
        let state = state_with(vec![a.clone(), b.clone()]);

        let outcome = apply(&state, ListEvent::Delete { id: a.id.clone() }).unwrap();
        assert_eq!(outcome.state.items, vec![b.clone()]);

        let rolled = rollback(outcome.state, outcome.revert);
        assert_eq!(rolled.items.len(), 2);
        assert!(rolled.items.contains(&a));
        assert!(rolled.items.contains(&b));
    }

    #[test]
    fn update_missing_item_is_rejected_without_mutation() {
        let state = state_with(vec![]);
        let err = apply(
            &state,
            ListEvent::Update {
                id: ItemId::new("missing"),
                patch: ItemPatch::default(),
            },
        )
        .unwrap_err();
        assert_eq!(err, ItemError::NotFound);
    }

    #[test]
    fn invalid_patch_is_rejected_before_any_state_change() {
        let item = ShoppingItem::new("Rice", Decimal::from(10), 3).unwrap();
        let state = state_with(vec![item.clone()]);

        let err = apply(
            &state,
            ListEvent::Update {
                id: item.id.clone(),
                patch: ItemPatch {
                    quantity: Some(0),
                    ..ItemPatch::default()
                },
            },
        )
        .unwrap_err();
        assert_eq!(err, ItemError::ZeroQuantity);
        assert_eq!(state.items, vec![item]);
    }

    #[test]
    fn clear_and_rollback_restores_everything() {
        let a = ShoppingItem::new("A", Decimal::ONE, 1).unwrap();
        let state = state_with(vec![a.clone()]);

        let outcome = apply(&state, ListEvent::Clear).unwrap();
        assert!(outcome.state.items.is_empty());

        let rolled = rollback(outcome.state, outcome.revert);
        assert_eq!(rolled.items, vec![a]);
    }
}
