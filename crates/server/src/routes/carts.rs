//! Cart CRUD routes for signed-in users.
//!
//! All routes require a session; mutations additionally require a paid plan,
//! which gates remote cart persistence. Every create is followed by a
//! best-effort sweep archiving the user's other active carts.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use rust_decimal::Decimal;

use tallycart_core::{
    CartDraft, CartId, CartPatch, CartStatus, ItemPatch, ShoppingCart, ShoppingItem,
};

use crate::cart::{CartsOverview, generate_cart_name};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::CurrentUser;
use crate::state::AppState;

/// A new item supplied by the client; IDs and totals are assigned server-side.
#[derive(Debug, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Request body for `POST /api/carts`.
#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemDraft>,
    pub currency: Option<String>,
}

/// Request body for `PATCH /api/carts/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub name: Option<String>,
    pub items: Option<Vec<ShoppingItem>>,
    pub currency: Option<String>,
}

fn require_paid(user: &CurrentUser) -> Result<()> {
    if user.plan.is_paid() {
        Ok(())
    } else {
        Err(AppError::PlanRequired)
    }
}

fn build_items(drafts: Vec<ItemDraft>) -> Result<Vec<ShoppingItem>> {
    drafts
        .into_iter()
        .map(|draft| ShoppingItem::new(&draft.name, draft.price, draft.quantity))
        .collect::<std::result::Result<_, _>>()
        .map_err(AppError::from)
}

/// Recompute totals on client-supplied items; the stored total is always
/// `price * quantity`.
fn normalize_items(items: Vec<ShoppingItem>) -> Result<Vec<ShoppingItem>> {
    items
        .into_iter()
        .map(|item| item.apply(&ItemPatch::default()))
        .collect::<std::result::Result<_, _>>()
        .map_err(AppError::from)
}

/// List all carts, most recently updated first.
///
/// GET /api/carts
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<ShoppingCart>>> {
    let carts = state.carts().list(&user.id).await?;
    Ok(Json(carts))
}

/// Cart count and average total across all carts.
///
/// GET /api/carts/overview
pub async fn overview(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartsOverview>> {
    let carts = state.carts().list(&user.id).await?;
    Ok(Json(CartsOverview::of(&carts)))
}

/// Create a cart.
///
/// POST /api/carts
///
/// Name is auto-generated (lowest unused `#NNN` suffix) when absent. The
/// per-user quota is enforced transactionally; hitting it returns 409. After
/// a successful create, other active carts are archived best-effort so at
/// most one cart stays active.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CreateCartRequest>,
) -> Result<(StatusCode, Json<ShoppingCart>)> {
    require_paid(&user)?;

    let items = build_items(request.items)?;

    let name = match request.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            let existing = state.carts().list(&user.id).await?;
            generate_cart_name(existing.iter().map(|cart| cart.name.as_str()))
        }
    };

    let draft = CartDraft {
        name,
        items,
        currency: request.currency,
    };

    let cart = state
        .carts()
        .create(&user.id, draft, state.config().max_carts)
        .await?;

    state
        .carts()
        .archive_other_active(&user.id, Some(&cart.id))
        .await;

    Ok((StatusCode::CREATED, Json(cart)))
}

/// Today's active cart, or `null`.
///
/// GET /api/carts/today
pub async fn today(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<Option<ShoppingCart>> {
    Json(state.carts().todays_active(&user.id).await)
}

/// A single cart.
///
/// GET /api/carts/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CartId>,
) -> Result<Json<ShoppingCart>> {
    let cart = state
        .carts()
        .get(&user.id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_owned()))?;
    Ok(Json(cart))
}

/// Partial update: only the supplied fields change, `updated_at` always
/// refreshes. Supplied items have their totals recomputed before persisting.
///
/// PATCH /api/carts/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CartId>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<ShoppingCart>> {
    require_paid(&user)?;

    let items = request.items.map(normalize_items).transpose()?;
    let patch = CartPatch {
        name: request.name,
        items,
        currency: request.currency,
    };

    state.carts().update(&user.id, &id, patch).await?;

    let cart = state
        .carts()
        .get(&user.id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_owned()))?;
    Ok(Json(cart))
}

/// Delete a cart. Only archived carts can be deleted; deleting a missing
/// cart is an idempotent 204.
///
/// DELETE /api/carts/{id}
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CartId>,
) -> Result<StatusCode> {
    require_paid(&user)?;

    // Get-then-delete is not transactional: a cart re-activated between the
    // two calls can still be deleted. Accepted, like the sweep race.
    match state.carts().get(&user.id, &id).await? {
        None => Ok(StatusCode::NO_CONTENT),
        Some(cart) if cart.status == CartStatus::Active => Err(AppError::Conflict(
            "Active carts cannot be deleted. Archive the cart first.".to_owned(),
        )),
        Some(_) => {
            state.carts().delete(&user.id, &id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

/// Archive a cart explicitly.
///
/// POST /api/carts/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CartId>,
) -> Result<StatusCode> {
    require_paid(&user)?;
    state.carts().archive(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
