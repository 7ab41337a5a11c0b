//! Tallycart Core - Shared domain types.
//!
//! This crate provides the domain model used across all Tallycart components:
//! - `server` - JSON API for cart persistence, profile sync, and guest lists
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, items, carts, currencies, settings, and plan tiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
