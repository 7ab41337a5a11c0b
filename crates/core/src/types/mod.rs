//! Core types for Tallycart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod currency;
pub mod id;
pub mod item;
pub mod settings;

pub use cart::{CartDraft, CartPatch, CartStatus, ShoppingCart};
pub use currency::{CURRENCIES, Currency, currency_by_code, format_amount};
pub use id::*;
pub use item::{ItemError, ItemPatch, ShoppingItem};
pub use settings::{AppSettings, Plan, Theme};
