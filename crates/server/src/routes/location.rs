//! IP geolocation route for currency detection.

use axum::{Json, extract::State, http::HeaderMap};

use crate::error::Result;
use crate::services::Location;
use crate::state::AppState;

/// Detect the caller's country and currency from their IP.
///
/// GET /api/location
///
/// The client IP comes from `X-Forwarded-For` (first hop) when the service
/// runs behind a proxy; without the header the upstream service resolves the
/// server's own address, which is only useful in development. Lookup failure
/// is a 502; callers fall back to the default currency.
pub async fn detect(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Location>> {
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let location = state.geo().lookup(client_ip).await?;
    Ok(Json(location))
}
