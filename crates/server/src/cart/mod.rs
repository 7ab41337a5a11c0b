//! Cart view logic: display aggregates, cart naming, and the optimistic
//! update contract.
//!
//! Everything in this module is pure; persistence and sessions live in
//! [`crate::db`] and the route layer.

pub mod names;
pub mod optimistic;
pub mod summary;

pub use names::generate_cart_name;
pub use optimistic::{ListEvent, ListState, Outcome, Revert};
pub use summary::{CartsOverview, ListSummary};
