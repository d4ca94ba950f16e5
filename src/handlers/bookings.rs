use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, DisplayStatus, NewBooking, Venue};
use crate::services::booking;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    #[serde(flatten)]
    booking: Booking,
    display_status: DisplayStatus,
}

impl BookingResponse {
    fn new(booking: Booking, now: NaiveDateTime) -> Self {
        let display_status = booking.display_status(now);
        Self {
            booking,
            display_status,
        }
    }
}

#[derive(Serialize)]
pub struct BookingDetailResponse {
    #[serde(flatten)]
    booking: BookingResponse,
    venue: Option<Venue>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let Json(body) = body?;
    let booking = booking::create_booking(&state, body)?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(booking, Utc::now().naive_utc())),
    ))
}

// GET /api/bookings?email=
#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let email = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty());

    let bookings = {
        let db = state.db()?;
        queries::list_bookings(&db, email)?
    };

    let now = Utc::now().naive_utc();
    Ok(Json(
        bookings
            .into_iter()
            .map(|b| BookingResponse::new(b, now))
            .collect(),
    ))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingDetailResponse>, AppError> {
    let (booking, venue) = {
        let db = state.db()?;
        let booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        let venue = queries::get_venue(&db, &booking.venue_id)?;
        (booking, venue)
    };

    Ok(Json(BookingDetailResponse {
        booking: BookingResponse::new(booking, Utc::now().naive_utc()),
        venue,
    }))
}

// PATCH /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = booking::cancel_booking(&state, &id)?;
    Ok(Json(BookingResponse::new(booking, Utc::now().naive_utc())))
}
