//! Trusted plan endpoint.
//!
//! The plan tier lives in server-only identity-provider metadata; clients
//! never write it directly. Both routes require a valid session. Changing
//! the plan also refreshes the cached tier in the session so quota gates see
//! it immediately.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use tallycart_core::Plan;

use crate::error::Result;
use crate::middleware::{RequireUser, auth::set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanBody {
    pub plan: Plan,
}

/// The caller's plan tier, initializing server-side metadata to the free
/// tier when absent.
///
/// GET /api/user/plan
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<PlanBody>> {
    let plan = state.profile_sync().plan(&user.id).await?;
    Ok(Json(PlanBody { plan }))
}

/// Persist a plan tier, echoing the stored value.
///
/// POST /api/user/plan
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Json(body): Json<PlanBody>,
) -> Result<Json<PlanBody>> {
    let plan = state.profile_sync().set_plan(&user.id, body.plan).await?;

    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            plan,
        },
    )
    .await?;

    Ok(Json(PlanBody { plan }))
}
