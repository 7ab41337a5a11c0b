//! Guest item-list routes, backed by the session.
//!
//! Visitors without an account keep their working list in the session store.
//! Mutations go through the optimistic-update module: the event is applied to
//! the loaded list and the full post-mutation list is persisted as one unit.
//! Invalid stored data degrades to an empty list rather than an error.

use axum::{Json, extract::Path, http::StatusCode};
use serde::Serialize;
use tower_sessions::Session;

use tallycart_core::{
    AppSettings, ItemError, ItemId, ItemPatch, ShoppingItem, currency_by_code, format_amount,
};

use crate::cart::{ListEvent, ListState, ListSummary, optimistic};
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::routes::carts::ItemDraft;

async fn load_items(session: &Session) -> Vec<ShoppingItem> {
    session
        .get::<Vec<ShoppingItem>>(session_keys::GUEST_ITEMS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn store_items(session: &Session, items: &[ShoppingItem]) -> Result<()> {
    session.insert(session_keys::GUEST_ITEMS, items).await?;
    Ok(())
}

/// Apply a mutation to the session list and persist the result.
///
/// Validation and not-found errors abort before anything is written; the
/// session keeps its pre-mutation list, which is the server-side equivalent
/// of a rollback.
async fn mutate(session: &Session, event: ListEvent) -> Result<Vec<ShoppingItem>> {
    let state = ListState::new(load_items(session).await);
    let outcome = optimistic::apply(&state, event).map_err(item_error)?;
    store_items(session, outcome.persist()).await?;
    Ok(outcome.state.items)
}

fn item_error(error: ItemError) -> AppError {
    match error {
        ItemError::NotFound => AppError::NotFound("Item not found".to_owned()),
        other => AppError::Validation(other),
    }
}

/// The session item list.
///
/// GET /api/items
pub async fn list(session: Session) -> Json<Vec<ShoppingItem>> {
    Json(load_items(&session).await)
}

/// Replace the whole session list. Supplied items are re-validated and their
/// totals recomputed.
///
/// PUT /api/items
pub async fn replace(
    session: Session,
    Json(items): Json<Vec<ShoppingItem>>,
) -> Result<Json<Vec<ShoppingItem>>> {
    let normalized: Vec<ShoppingItem> = items
        .into_iter()
        .map(|item| item.apply(&ItemPatch::default()))
        .collect::<std::result::Result<_, _>>()
        .map_err(AppError::from)?;

    store_items(&session, &normalized).await?;
    Ok(Json(normalized))
}

/// Add an item to the session list.
///
/// POST /api/items
pub async fn add(
    session: Session,
    Json(draft): Json<ItemDraft>,
) -> Result<(StatusCode, Json<ShoppingItem>)> {
    let item = ShoppingItem::new(&draft.name, draft.price, draft.quantity)?;
    mutate(&session, ListEvent::Add(item.clone())).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Patch an item in the session list.
///
/// PATCH /api/items/{id}
pub async fn update(
    session: Session,
    Path(id): Path<ItemId>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<Vec<ShoppingItem>>> {
    let items = mutate(&session, ListEvent::Update { id, patch }).await?;
    Ok(Json(items))
}

/// Remove an item from the session list.
///
/// DELETE /api/items/{id}
pub async fn remove(session: Session, Path(id): Path<ItemId>) -> Result<Json<Vec<ShoppingItem>>> {
    let items = mutate(&session, ListEvent::Delete { id }).await?;
    Ok(Json(items))
}

/// Clear the session list.
///
/// DELETE /api/items
pub async fn clear(session: Session) -> Result<StatusCode> {
    mutate(&session, ListEvent::Clear).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Totals for the session list, formatted in the session's currency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: ListSummary,
    pub formatted_total: String,
    pub currency: String,
}

/// GET /api/items/summary
pub async fn summary(session: Session) -> Json<SummaryResponse> {
    let items = load_items(&session).await;
    let settings: AppSettings = session
        .get(session_keys::GUEST_SETTINGS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    let summary = ListSummary::of(&items);
    let formatted_total = format_amount(summary.total_amount, currency_by_code(&settings.currency));

    Json(SummaryResponse {
        summary,
        formatted_total,
        currency: settings.currency,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn item_not_found_maps_to_404_not_validation() {
        let err = item_error(ItemError::NotFound);
        assert!(matches!(err, AppError::NotFound(_)));

        let err = item_error(ItemError::ZeroQuantity);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn summary_response_flattens_totals() {
        let items = vec![ShoppingItem::new("Tea", Decimal::from(5), 2).unwrap()];
        let response = SummaryResponse {
            summary: ListSummary::of(&items),
            formatted_total: format_amount(Decimal::from(10), currency_by_code("USD")),
            currency: "USD".to_owned(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalQuantity"], 2);
        assert_eq!(json["formattedTotal"], "$10.00");
    }
}
