//! Session-stored types.
//!
//! The session carries the signed-in identity plus guest-mode state for
//! visitors who have not signed in (their working item list and settings
//! live here instead of the database).

use serde::{Deserialize, Serialize};

use tallycart_core::{Plan, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user. The
/// plan tier is cached here so cart-quota checks do not call the identity
/// provider on every request; it refreshes on sign-in and on plan changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity-provider user ID.
    pub id: UserId,
    /// Cached plan tier.
    pub plan: Plan,
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for a guest's working item list.
    pub const GUEST_ITEMS: &str = "guest_items";

    /// Key for a guest's app settings.
    pub const GUEST_SETTINGS: &str = "guest_settings";
}
