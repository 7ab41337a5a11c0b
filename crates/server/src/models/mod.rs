//! Request-scoped models shared across routes.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
