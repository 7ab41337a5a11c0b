//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (DB ping)
//!
//! # Auth
//! POST   /auth/session            - Sign in with an identity-provider token
//! DELETE /auth/session            - Sign out
//!
//! # Carts (require auth; mutations require a paid plan)
//! GET    /api/carts               - List all carts
//! POST   /api/carts               - Create a cart (auto-named, quota-checked)
//! GET    /api/carts/overview      - Cart count and average total
//! GET    /api/carts/today         - Today's active cart, or null
//! GET    /api/carts/{id}          - A single cart
//! PATCH  /api/carts/{id}          - Partial update (name/items/currency)
//! DELETE /api/carts/{id}          - Delete (archived carts only)
//! POST   /api/carts/{id}/archive  - Archive explicitly
//!
//! # Guest item list (session-backed)
//! GET    /api/items               - The session item list
//! PUT    /api/items               - Replace the session item list
//! POST   /api/items               - Add an item
//! DELETE /api/items               - Clear the list
//! PATCH  /api/items/{id}          - Patch an item
//! DELETE /api/items/{id}          - Remove an item
//! GET    /api/items/summary       - Totals for the session list
//!
//! # Settings & plan
//! GET    /api/user/settings       - Current settings (profile or session)
//! PUT    /api/user/settings       - Update settings
//! GET    /api/user/plan           - Plan tier (initializes to free)
//! POST   /api/user/plan           - Persist a plan tier
//!
//! GET    /api/location            - IP geolocation currency detection
//! ```

pub mod auth;
pub mod carts;
pub mod health;
pub mod items;
pub mod location;
pub mod plan;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/session", post(auth::sign_in).delete(auth::sign_out))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(carts::list).post(carts::create))
        .route("/overview", get(carts::overview))
        .route("/today", get(carts::today))
        .route(
            "/{id}",
            get(carts::show).patch(carts::update).delete(carts::remove),
        )
        .route("/{id}/archive", post(carts::archive))
}

/// Create the guest item-list routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(items::list)
                .put(items::replace)
                .post(items::add)
                .delete(items::clear),
        )
        .route("/summary", get(items::summary))
        .route("/{id}", axum::routing::patch(items::update).delete(items::remove))
}

/// Create the user settings and plan routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(settings::show).put(settings::update))
        .route("/plan", get(plan::show).post(plan::update))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/auth", auth_routes())
        .nest("/api/carts", cart_routes())
        .nest("/api/items", item_routes())
        .nest("/api/user", user_routes())
        .route("/api/location", get(location::detect))
}
