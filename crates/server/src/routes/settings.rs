//! User settings routes.
//!
//! Signed-in users write through to identity-provider profile metadata;
//! guests keep settings in the session. Reads return the effective settings
//! either way.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;

use tallycart_core::{AppSettings, Theme};

use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::models::session_keys;
use crate::state::AppState;

/// Partial settings update; only supplied fields change.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub currency: Option<String>,
    pub theme: Option<Theme>,
}

async fn guest_settings(session: &Session) -> AppSettings {
    session
        .get::<AppSettings>(session_keys::GUEST_SETTINGS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Effective settings for the caller.
///
/// GET /api/user/settings
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Result<Json<AppSettings>> {
    let settings = match user {
        Some(user) => {
            let profile = state.profile_sync().current(&user.id).await?;
            AppSettings {
                currency: profile.currency,
                theme: profile.theme,
            }
        }
        None => guest_settings(&session).await,
    };

    Ok(Json(settings))
}

/// Update settings, merging only the supplied fields.
///
/// PUT /api/user/settings
pub async fn update(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Json(request): Json<SettingsUpdate>,
) -> Result<Json<AppSettings>> {
    match user {
        Some(user) => {
            if let Some(currency) = &request.currency {
                state.profile_sync().set_currency(&user.id, currency).await?;
            }
            if let Some(theme) = request.theme {
                state.profile_sync().set_theme(&user.id, theme).await?;
            }

            let profile = state.profile_sync().current(&user.id).await?;
            Ok(Json(AppSettings {
                currency: profile.currency,
                theme: profile.theme,
            }))
        }
        None => {
            let mut settings = guest_settings(&session).await;
            if let Some(currency) = request.currency {
                settings.currency = currency;
            }
            if let Some(theme) = request.theme {
                settings.theme = theme;
            }

            session
                .insert(session_keys::GUEST_SETTINGS, &settings)
                .await?;
            Ok(Json(settings))
        }
    }
}
