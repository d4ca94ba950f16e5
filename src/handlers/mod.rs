pub mod admin;
pub mod bookings;
pub mod health;
pub mod stats;
pub mod venues;

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/stats", get(stats::get_stats))
        .route(
            "/venues",
            get(venues::list_venues).post(admin::create_venue),
        )
        .route(
            "/venues/:id",
            get(venues::get_venue).patch(admin::update_venue),
        )
        .route("/venues/:id/availability", get(venues::get_availability))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", patch(bookings::cancel_booking));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
