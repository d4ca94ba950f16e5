use chrono::Utc;

use crate::db::queries::{self, InsertOutcome};
use crate::errors::AppError;
use crate::models::availability::{compute_availability, hourly_slots};
use crate::models::booking::parse_date;
use crate::models::{Booking, BookingStatus, NewBooking, PaymentStatus, Slot};
use crate::services::notifications::Notification;
use crate::state::AppState;

fn venue_not_found() -> AppError {
    AppError::NotFound("Venue not found".to_string())
}

fn booking_not_found() -> AppError {
    AppError::NotFound("Booking not found".to_string())
}

/// Hourly slots of a venue on `date`, with the ones held by active bookings
/// marked unavailable. Always reads the current bookings.
pub fn venue_availability(
    state: &AppState,
    venue_id: &str,
    date: Option<&str>,
) -> Result<Vec<Slot>, AppError> {
    let db = state.db()?;
    let venue = queries::get_venue(&db, venue_id)?.ok_or_else(venue_not_found)?;

    let date = date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("date query parameter is required".to_string()))?;
    if parse_date(date).is_none() {
        return Err(AppError::Validation(format!(
            "invalid date: {date}, expected YYYY-MM-DD"
        )));
    }

    let booked = queries::get_booked_slots(&db, venue_id, date)?;

    compute_availability(
        &venue.open_time,
        &venue.close_time,
        booked.iter().map(String::as_str),
    )
    .map_err(|e| AppError::Dependency(anyhow::anyhow!("venue {venue_id} has bad hours: {e}")))
}

/// Claims one slot. The pre-check gives a fast answer for slots that are
/// visibly taken; the active-slot unique index decides races.
pub fn create_booking(state: &AppState, request: NewBooking) -> Result<Booking, AppError> {
    let request = request.validate().map_err(AppError::Validation)?;

    let venue = {
        let db = state.db()?;
        let venue = queries::get_venue(&db, &request.venue_id)?.ok_or_else(venue_not_found)?;

        if !venue.is_active {
            return Err(AppError::Validation(
                "This venue is not accepting bookings".to_string(),
            ));
        }

        let slots = hourly_slots(&venue.open_time, &venue.close_time).map_err(|e| {
            AppError::Dependency(anyhow::anyhow!("venue {} has bad hours: {e}", venue.id))
        })?;
        if !slots.contains(&request.time_slot) {
            return Err(AppError::Validation(format!(
                "time slot {} is outside the venue's hours ({} - {})",
                request.time_slot, venue.open_time, venue.close_time
            )));
        }

        if queries::find_active_booking(&db, &venue.id, &request.date, &request.time_slot)?
            .is_some()
        {
            return Err(AppError::slot_taken());
        }
        venue
    };

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        venue_id: venue.id.clone(),
        venue_name: venue.name.clone(),
        sport: venue.sport,
        date: request.date,
        time_slot: request.time_slot,
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        customer_phone: request.customer_phone,
        price: venue.price_per_hour,
        payment_status: PaymentStatus::Pending,
        reminder_sent: false,
        status: BookingStatus::Confirmed,
        created_at: now,
        updated_at: now,
    };

    claim_slot(state, &booking)?;

    tracing::info!(
        booking_id = %booking.id,
        venue_id = %booking.venue_id,
        date = %booking.date,
        slot = %booking.time_slot,
        "booking created"
    );

    state.notifier.notify(Notification::BookingConfirmed {
        booking: booking.clone(),
        venue,
    });

    Ok(booking)
}

/// Inserts the booking. Losing the slot to another active booking, including
/// one written after the pre-check, is a conflict.
fn claim_slot(state: &AppState, booking: &Booking) -> Result<(), AppError> {
    let outcome = {
        let db = state.db()?;
        queries::insert_booking(&db, booking)?
    };
    if outcome == InsertOutcome::SlotTaken {
        tracing::info!(
            venue_id = %booking.venue_id,
            date = %booking.date,
            slot = %booking.time_slot,
            "slot claimed concurrently, booking rejected"
        );
        return Err(AppError::slot_taken());
    }
    Ok(())
}

/// Marks a booking cancelled. Cancelling twice is allowed and changes nothing
/// but the update timestamp; each call sends a cancellation email.
pub fn cancel_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    let (booking, venue) = {
        let db = state.db()?;
        if queries::get_booking_by_id(&db, id)?.is_none() {
            return Err(booking_not_found());
        }
        queries::update_booking_status(&db, id, BookingStatus::Cancelled)?;

        let booking = queries::get_booking_by_id(&db, id)?.ok_or_else(booking_not_found)?;
        let venue = queries::get_venue(&db, &booking.venue_id)?;
        (booking, venue)
    };

    tracing::info!(booking_id = %booking.id, venue_id = %booking.venue_id, "booking cancelled");

    match venue {
        Some(venue) => state.notifier.notify(Notification::BookingCancelled {
            booking: booking.clone(),
            venue,
        }),
        None => tracing::warn!(
            booking_id = %booking.id,
            venue_id = %booking.venue_id,
            "venue missing, cancellation email skipped"
        ),
    }

    Ok(booking)
}
