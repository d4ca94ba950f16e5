use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{NewVenue, Venue, VenueUpdate};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/venues
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewVenue>, JsonRejection>,
) -> Result<(StatusCode, Json<Venue>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(body) = body?;
    body.validate().map_err(AppError::Validation)?;

    let venue = body.into_venue(uuid::Uuid::new_v4().to_string(), Utc::now().naive_utc());
    {
        let db = state.db()?;
        queries::insert_venue(&db, &venue)?;
    }

    tracing::info!(venue_id = %venue.id, name = %venue.name, sport = venue.sport.as_str(), "venue created");
    Ok((StatusCode::CREATED, Json(venue)))
}

// PATCH /api/venues/:id
pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<VenueUpdate>, JsonRejection>,
) -> Result<Json<Venue>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(body) = body?;
    body.validate().map_err(AppError::Validation)?;

    let venue = {
        let db = state.db()?;
        let mut venue = queries::get_venue(&db, &id)?
            .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
        body.apply(&mut venue);
        venue.updated_at = Utc::now().naive_utc();
        queries::update_venue(&db, &venue)?;
        venue
    };

    tracing::info!(venue_id = %venue.id, active = venue.is_active, "venue updated");
    Ok(Json(venue))
}
