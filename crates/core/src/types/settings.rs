//! User preferences and plan tiers.

use serde::{Deserialize, Serialize};

/// UI theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Locally persisted settings for anonymous users, and the fallback when
/// remote sync fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// ISO 4217 currency code.
    pub currency: String,
    pub theme: Theme,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_owned(),
            theme: Theme::System,
        }
    }
}

/// Subscription tier: 0 is the free tier, 1 and above are paid.
///
/// Paid plans gate remote cart persistence and multi-cart features. The
/// value lives in server-only identity-provider metadata and is never
/// written by untrusted client code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Plan(pub i64);

impl Plan {
    pub const FREE: Self = Self(0);

    #[must_use]
    pub const fn is_paid(self) -> bool {
        self.0 >= 1
    }
}
