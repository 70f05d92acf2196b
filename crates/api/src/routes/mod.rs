//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//!
//! # Front-end API (CORS)
//! POST /api/address/validate        - Verify a shipping address
//! POST /api/coupons/validate        - Check a coupon code
//! GET  /api/shipping/service        - Carrier/service for an order
//! OPTIONS /api/*                    - Preflight (answered by CORS middleware)
//!
//! # Embeds
//! GET  /embed/forms/{form_id}       - Form widget snippet (HTML)
//! ```

pub mod address;
pub mod coupons;
pub mod embed;
pub mod shipping;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::cors_middleware;
use crate::state::AppState;

/// Create the front-end API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/address/validate", post(address::validate))
        .route("/coupons/validate", post(coupons::validate))
        .route("/shipping/service", get(shipping::service))
}

/// Create the embed routes router.
pub fn embed_routes() -> Router<AppState> {
    Router::new().route("/forms/{form_id}", get(embed::form))
}

/// Create all routes.
///
/// The CORS layer uses `layer`, not `route_layer`, so it also sees `OPTIONS`
/// on POST-only routes and answers the preflight itself.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest(
            "/api",
            api_routes().layer(from_fn_with_state(state.clone(), cors_middleware)),
        )
        .nest("/embed", embed_routes())
}
