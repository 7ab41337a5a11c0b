//! Profile sync: reconciles currency/theme/plan between identity-provider
//! metadata and the session.
//!
//! Seeding runs at most once per user ID per process. Existing explicit
//! values are never overwritten; only missing fields are filled in. The plan
//! tier lives in server-only metadata and is initialized to the free tier on
//! first contact.

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::{Map, Value, json};

use tallycart_core::{Plan, Theme, UserId};

use crate::identity::{IdentityClient, IdentityError};

/// The reconciled preferences for a signed-in user.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncedProfile {
    pub currency: String,
    pub theme: Theme,
    pub plan: Plan,
}

/// Reconciles user preferences with identity-provider metadata.
#[derive(Debug)]
pub struct ProfileSync {
    identity: IdentityClient,
    default_currency: String,
    /// User IDs already seeded this process; seeding runs at most once per
    /// ID per session.
    initialized: Mutex<HashSet<UserId>>,
}

impl ProfileSync {
    #[must_use]
    pub fn new(identity: IdentityClient, default_currency: String) -> Self {
        Self {
            identity,
            default_currency,
            initialized: Mutex::new(HashSet::new()),
        }
    }

    /// Reconcile preferences on sign-in.
    ///
    /// Reads the user's metadata; on the first observation of this user ID,
    /// seeds any missing currency/theme (detected currency when available,
    /// the configured default otherwise) by writing back only the missing
    /// fields. Seed-write failures are logged and swallowed; the reconciled
    /// values are still returned.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the user record cannot be read at all.
    pub async fn on_sign_in(
        &self,
        user_id: &UserId,
        detected_currency: Option<&str>,
    ) -> Result<SyncedProfile, IdentityError> {
        let user = self.identity.get_user(user_id).await?;

        let first_time = {
            self.initialized
                .lock()
                .expect("profile sync mutex poisoned")
                .insert(user_id.clone())
        };

        let outcome = reconcile(
            &user.profile_metadata,
            detected_currency,
            &self.default_currency,
        );

        if first_time && let Some(seed) = outcome.seed {
            if let Err(error) = self.identity.update_profile_metadata(user_id, &seed).await {
                tracing::warn!(%user_id, %error, "failed to seed profile metadata");
            }
        }

        let plan = self.ensure_plan(user_id, &user.private_metadata).await;

        Ok(SyncedProfile {
            currency: outcome.currency,
            theme: outcome.theme,
            plan,
        })
    }

    /// Current preferences without any seeding writes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the user record cannot be read.
    pub async fn current(&self, user_id: &UserId) -> Result<SyncedProfile, IdentityError> {
        let user = self.identity.get_user(user_id).await?;
        let outcome = reconcile(&user.profile_metadata, None, &self.default_currency);
        let plan = Plan(
            user.private_metadata
                .get("plan")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        );

        Ok(SyncedProfile {
            currency: outcome.currency,
            theme: outcome.theme,
            plan,
        })
    }

    /// Write-through an explicit currency change.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the metadata read or write fails; the
    /// caller surfaces it so the UI can fall back.
    pub async fn set_currency(&self, user_id: &UserId, currency: &str) -> Result<(), IdentityError> {
        let user = self.identity.get_user(user_id).await?;
        if user.profile_metadata.get("currency").and_then(Value::as_str) == Some(currency) {
            return Ok(());
        }

        let mut merged = user.profile_metadata;
        merged.insert("currency".to_owned(), json!(currency));
        self.identity
            .update_profile_metadata(user_id, &merged)
            .await?;
        Ok(())
    }

    /// Write-through an explicit theme change.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the metadata read or write fails.
    pub async fn set_theme(&self, user_id: &UserId, theme: Theme) -> Result<(), IdentityError> {
        let user = self.identity.get_user(user_id).await?;
        let current = user
            .profile_metadata
            .get("theme")
            .and_then(Value::as_str)
            .and_then(parse_theme);
        if current == Some(theme) {
            return Ok(());
        }

        let mut merged = user.profile_metadata;
        merged.insert("theme".to_owned(), json!(theme_str(theme)));
        self.identity
            .update_profile_metadata(user_id, &merged)
            .await?;
        Ok(())
    }

    /// The user's plan tier, initializing server-only metadata to the free
    /// tier (and persisting it) when absent.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the user record cannot be read.
    pub async fn plan(&self, user_id: &UserId) -> Result<Plan, IdentityError> {
        let user = self.identity.get_user(user_id).await?;
        if let Some(plan) = user.private_metadata.get("plan").and_then(Value::as_i64) {
            return Ok(Plan(plan));
        }

        let mut merged = user.private_metadata;
        merged.insert("plan".to_owned(), json!(0));
        let updated = self
            .identity
            .update_private_metadata(user_id, &merged)
            .await?;

        Ok(Plan(
            updated
                .private_metadata
                .get("plan")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        ))
    }

    /// Persist a plan tier into server-only metadata, returning the stored
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the metadata read or write fails.
    pub async fn set_plan(&self, user_id: &UserId, plan: Plan) -> Result<Plan, IdentityError> {
        let user = self.identity.get_user(user_id).await?;
        let mut merged = user.private_metadata;
        merged.insert("plan".to_owned(), json!(plan.0));
        let updated = self
            .identity
            .update_private_metadata(user_id, &merged)
            .await?;

        Ok(Plan(
            updated
                .private_metadata
                .get("plan")
                .and_then(Value::as_i64)
                .unwrap_or(plan.0),
        ))
    }

    async fn ensure_plan(&self, user_id: &UserId, private_metadata: &Map<String, Value>) -> Plan {
        if let Some(plan) = private_metadata.get("plan").and_then(Value::as_i64) {
            return Plan(plan);
        }

        let mut merged = private_metadata.clone();
        merged.insert("plan".to_owned(), json!(0));
        match self
            .identity
            .update_private_metadata(user_id, &merged)
            .await
        {
            Ok(updated) => Plan(
                updated
                    .private_metadata
                    .get("plan")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            ),
            Err(error) => {
                tracing::warn!(%user_id, %error, "failed to initialize plan metadata");
                Plan::FREE
            }
        }
    }
}

/// The pure reconciliation decision: which values apply, and what (if
/// anything) to seed back.
#[derive(Debug, Clone)]
struct Reconciled {
    currency: String,
    theme: Theme,
    /// Full metadata map to write back, present only when a field was
    /// missing. Existing explicit values are carried over unchanged.
    seed: Option<Map<String, Value>>,
}

fn reconcile(
    metadata: &Map<String, Value>,
    detected_currency: Option<&str>,
    default_currency: &str,
) -> Reconciled {
    let existing_currency = metadata.get("currency").and_then(Value::as_str);
    let existing_theme = metadata
        .get("theme")
        .and_then(Value::as_str)
        .and_then(parse_theme);

    let currency = existing_currency
        .unwrap_or_else(|| detected_currency.unwrap_or(default_currency))
        .to_owned();
    let theme = existing_theme.unwrap_or(Theme::Light);

    let seed = if existing_currency.is_none() || existing_theme.is_none() {
        let mut merged = metadata.clone();
        merged.insert("currency".to_owned(), json!(currency));
        merged.insert("theme".to_owned(), json!(theme_str(theme)));
        Some(merged)
    } else {
        None
    };

    Reconciled {
        currency,
        theme,
        seed,
    }
}

fn parse_theme(raw: &str) -> Option<Theme> {
    match raw {
        "light" => Some(Theme::Light),
        "dark" => Some(Theme::Dark),
        "system" => Some(Theme::System),
        _ => None,
    }
}

const fn theme_str(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
        Theme::System => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn seeds_defaults_when_metadata_is_empty() {
        let outcome = reconcile(&Map::new(), None, "INR");
        assert_eq!(outcome.currency, "INR");
        assert_eq!(outcome.theme, Theme::Light);

        let seed = outcome.seed.expect("empty metadata must be seeded");
        assert_eq!(seed.get("currency"), Some(&json!("INR")));
        assert_eq!(seed.get("theme"), Some(&json!("light")));
    }

    #[test]
    fn detected_currency_wins_over_default_for_seeding() {
        let outcome = reconcile(&Map::new(), Some("EUR"), "INR");
        assert_eq!(outcome.currency, "EUR");
    }

    #[test]
    fn never_overwrites_explicit_values() {
        let existing = metadata(&[("currency", json!("GBP")), ("theme", json!("dark"))]);
        let outcome = reconcile(&existing, Some("EUR"), "INR");
        assert_eq!(outcome.currency, "GBP");
        assert_eq!(outcome.theme, Theme::Dark);
        assert!(outcome.seed.is_none(), "nothing missing, nothing written");
    }

    #[test]
    fn fills_only_the_missing_field_and_keeps_the_rest() {
        let existing = metadata(&[("currency", json!("GBP")), ("nickname", json!("sam"))]);
        let outcome = reconcile(&existing, None, "INR");
        assert_eq!(outcome.currency, "GBP");
        assert_eq!(outcome.theme, Theme::Light);

        let seed = outcome.seed.expect("missing theme must be seeded");
        assert_eq!(seed.get("currency"), Some(&json!("GBP")));
        assert_eq!(seed.get("theme"), Some(&json!("light")));
        assert_eq!(seed.get("nickname"), Some(&json!("sam")));
    }

    #[test]
    fn unknown_theme_value_is_reseeded() {
        let existing = metadata(&[("currency", json!("USD")), ("theme", json!("neon"))]);
        let outcome = reconcile(&existing, None, "INR");
        assert_eq!(outcome.theme, Theme::Light);
        assert!(outcome.seed.is_some());
    }
}
