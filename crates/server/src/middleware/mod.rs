//! HTTP middleware: session management and auth extractors.

pub mod auth;
pub mod session;

pub use auth::{OptionalUser, RequireUser};
pub use session::create_session_layer;
