//! Session sign-in and sign-out.
//!
//! Authentication itself happens at the identity provider; the client hands
//! over a session token, the server verifies it and establishes its own
//! cookie session carrying the user ID and cached plan tier.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use tallycart_core::{Plan, Theme, UserId};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::identity::IdentityError;
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Request body for `POST /auth/session`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Identity-provider session token.
    pub token: String,
    /// Currency detected client-side (geolocation), used only to seed a
    /// missing preference.
    pub detected_currency: Option<String>,
}

/// Response body for `POST /auth/session`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user_id: UserId,
    pub currency: String,
    pub theme: Theme,
    pub plan: Plan,
}

/// Verify an identity-provider token and establish a session.
///
/// POST /auth/session
///
/// Runs profile sync on success: missing preferences are seeded, the plan
/// tier is read (initializing to free), and the result is cached in the
/// session.
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let claims = state
        .identity()
        .verify_session(&request.token)
        .await
        .map_err(|error| match error {
            IdentityError::InvalidSession => {
                AppError::Unauthorized("Invalid or expired session token".to_owned())
            }
            other => AppError::Identity(other),
        })?;

    let user_id = UserId::new(claims.user_id);
    let profile = state
        .profile_sync()
        .on_sign_in(&user_id, request.detected_currency.as_deref())
        .await?;

    let user = CurrentUser {
        id: user_id.clone(),
        plan: profile.plan,
    };
    set_current_user(&session, &user).await?;
    set_sentry_user(&user_id);

    Ok(Json(SignInResponse {
        user_id,
        currency: profile.currency,
        theme: profile.theme,
        plan: profile.plan,
    }))
}

/// Sign out, destroying the session.
///
/// DELETE /auth/session
pub async fn sign_out(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
