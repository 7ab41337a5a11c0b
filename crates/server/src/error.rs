//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use tallycart_core::ItemError;

use crate::db::RepositoryError;
use crate::identity::IdentityError;
use crate::services::location::GeoError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Geolocation lookup failed.
    #[error("Geolocation error: {0}")]
    Geo(#[from] GeoError),

    /// Item input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ItemError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Operation conflicts with current resource state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Feature requires a paid plan.
    #[error("Paid plan required")]
    PlanRequired,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry. Quota rejections are expected
        // user-facing outcomes, not faults.
        let is_quota = matches!(self, Self::Repository(RepositoryError::CartLimit { .. }));
        if !is_quota
            && matches!(
                self,
                Self::Repository(_) | Self::Identity(_) | Self::Session(_) | Self::Internal(_)
            )
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Repository(err) => match err {
                RepositoryError::CartLimit { .. } => StatusCode::CONFLICT,
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(_) | Self::Geo(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PlanRequired => StatusCode::FORBIDDEN,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Repository(err) => match err {
                RepositoryError::CartLimit { max } => format!(
                    "You have reached the maximum limit of {max} carts. \
                     To create a new cart, please delete some of your existing carts first."
                ),
                RepositoryError::NotFound => "Cart not found".to_owned(),
                _ => "Internal server error".to_owned(),
            },
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Identity(_) => "External service error".to_owned(),
            Self::Geo(_) => "Failed to fetch location data".to_owned(),
            Self::PlanRequired => {
                "Sign in and upgrade to Pro to manage multiple carts.".to_owned()
            }
            Self::Validation(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
