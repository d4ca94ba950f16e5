use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Slot, Sport, Venue};
use crate::services::booking;
use crate::state::AppState;

// GET /api/venues
#[derive(Debug, Deserialize)]
pub struct VenuesQuery {
    pub sport: Option<String>,
    pub search: Option<String>,
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VenuesQuery>,
) -> Result<Json<Vec<Venue>>, AppError> {
    let sport = match query.sport.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(name) => Some(
            Sport::parse(name)
                .ok_or_else(|| AppError::Validation(format!("unknown sport: {name}")))?,
        ),
    };
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let venues = {
        let db = state.db()?;
        queries::list_active_venues(&db, sport, search)?
    };

    tracing::debug!(count = venues.len(), "listed venues");
    Ok(Json(venues))
}

// GET /api/venues/:id
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Venue>, AppError> {
    let venue = {
        let db = state.db()?;
        queries::get_venue(&db, &id)?
    };

    venue
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))
}

// GET /api/venues/:id/availability?date=YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    booking::venue_availability(&state, &id, query.date.as_deref()).map(Json)
}
