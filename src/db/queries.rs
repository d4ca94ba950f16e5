use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;

use crate::models::{Booking, BookingStatus, PaymentStatus, Sport, Venue};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const VENUE_COLUMNS: &str = "id, name, sport, location, price_per_hour, capacity, facilities, rating, \
     image, description, open_time, close_time, is_active, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, venue_id, venue_name, sport, date, time_slot, customer_name, \
     customer_email, customer_phone, price, payment_status, reminder_sent, status, created_at, updated_at";

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_sport(s: &str) -> anyhow::Result<Sport> {
    Sport::parse(s).ok_or_else(|| anyhow::anyhow!("unknown sport stored: {s}"))
}

// ── Venues ──

pub fn insert_venue(conn: &Connection, venue: &Venue) -> anyhow::Result<()> {
    let facilities = serde_json::to_string(&venue.facilities)?;
    conn.execute(
        "INSERT INTO venues (id, name, sport, location, price_per_hour, capacity, facilities, rating,
                             image, description, open_time, close_time, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            venue.id,
            venue.name,
            venue.sport.as_str(),
            venue.location,
            venue.price_per_hour,
            venue.capacity,
            facilities,
            venue.rating,
            venue.image,
            venue.description,
            venue.open_time,
            venue.close_time,
            venue.is_active,
            format_timestamp(&venue.created_at),
            format_timestamp(&venue.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_venue(conn: &Connection, id: &str) -> anyhow::Result<Option<Venue>> {
    let venue = conn
        .query_row(
            &format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1"),
            params![id],
            |row| Ok(parse_venue_row(row)),
        )
        .optional()?;

    venue.transpose()
}

/// Active venues, best rated first. `search` is a case-insensitive substring
/// matched against name, location and description.
pub fn list_active_venues(
    conn: &Connection,
    sport: Option<Sport>,
    search: Option<&str>,
) -> anyhow::Result<Vec<Venue>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VENUE_COLUMNS} FROM venues
         WHERE is_active = 1
           AND (?1 IS NULL OR sport = ?1)
           AND (?2 IS NULL
                OR instr(lower(name), lower(?2)) > 0
                OR instr(lower(location), lower(?2)) > 0
                OR instr(lower(description), lower(?2)) > 0)
         ORDER BY rating DESC, name ASC"
    ))?;

    let rows = stmt.query_map(params![sport.map(|s| s.as_str()), search], |row| {
        Ok(parse_venue_row(row))
    })?;

    let mut venues = vec![];
    for row in rows {
        venues.push(row??);
    }
    Ok(venues)
}

/// Persists the mutable venue fields. Returns false if the venue is unknown.
pub fn update_venue(conn: &Connection, venue: &Venue) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE venues SET price_per_hour = ?1, rating = ?2, is_active = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            venue.price_per_hour,
            venue.rating,
            venue.is_active,
            format_timestamp(&venue.updated_at),
            venue.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn count_venues(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM venues", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_venue_row(row: &rusqlite::Row) -> anyhow::Result<Venue> {
    let sport_str: String = row.get(2)?;
    let facilities_json: String = row.get(6)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        sport: parse_sport(&sport_str)?,
        location: row.get(3)?,
        price_per_hour: row.get(4)?,
        capacity: row.get(5)?,
        facilities: serde_json::from_str(&facilities_json).unwrap_or_default(),
        rating: row.get(7)?,
        image: row.get(8)?,
        description: row.get(9)?,
        open_time: row.get(10)?,
        close_time: row.get(11)?,
        is_active: row.get(12)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

// ── Bookings ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The active-slot unique index rejected the row.
    SlotTaken,
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<InsertOutcome> {
    let result = conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            booking.id,
            booking.venue_id,
            booking.venue_name,
            booking.sport.as_str(),
            booking.date,
            booking.time_slot,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.price,
            booking.payment_status.as_str(),
            booking.reminder_sent,
            booking.status.as_str(),
            format_timestamp(&booking.created_at),
            format_timestamp(&booking.updated_at),
        ],
    );

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(InsertOutcome::SlotTaken)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_active_booking(
    conn: &Connection,
    venue_id: &str,
    date: &str,
    time_slot: &str,
) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 WHERE venue_id = ?1 AND date = ?2 AND time_slot = ?3 AND status != 'cancelled'"
            ),
            params![venue_id, date, time_slot],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    booking.transpose()
}

/// Time slots held by active bookings for a venue on a date.
pub fn get_booked_slots(conn: &Connection, venue_id: &str, date: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM bookings
         WHERE venue_id = ?1 AND date = ?2 AND status != 'cancelled'
         ORDER BY time_slot ASC",
    )?;

    let rows = stmt.query_map(params![venue_id, date], |row| row.get::<_, String>(0))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    booking.transpose()
}

/// All bookings, or those of one customer email, newest first.
pub fn list_bookings(conn: &Connection, email: Option<&str>) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE ?1 IS NULL OR customer_email = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map(params![email], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = format_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Confirmed bookings on `date` that have not had a reminder yet.
pub fn get_due_reminders(conn: &Connection, date: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE date = ?1 AND status = 'confirmed' AND reminder_sent = 0
         ORDER BY time_slot ASC, rowid ASC"
    ))?;

    let rows = stmt.query_map(params![date], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn mark_reminder_sent(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = format_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET reminder_sent = 1, updated_at = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let sport_str: String = row.get(3)?;
    let payment_status_str: String = row.get(10)?;
    let status_str: String = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    Ok(Booking {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        venue_name: row.get(2)?,
        sport: parse_sport(&sport_str)?,
        date: row.get(4)?,
        time_slot: row.get(5)?,
        customer_name: row.get(6)?,
        customer_email: row.get(7)?,
        customer_phone: row.get(8)?,
        price: row.get(9)?,
        payment_status: PaymentStatus::parse(&payment_status_str),
        reminder_sent: row.get(11)?,
        status: BookingStatus::parse(&status_str),
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

// ── Stats ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_venues: i64,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub sports: BTreeMap<&'static str, i64>,
}

pub fn get_catalog_stats(conn: &Connection) -> anyhow::Result<CatalogStats> {
    let total_venues: i64 =
        conn.query_row("SELECT COUNT(*) FROM venues WHERE is_active = 1", [], |row| row.get(0))?;
    let total_bookings: i64 = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    let active_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'",
        [],
        |row| row.get(0),
    )?;

    let mut sports: BTreeMap<&'static str, i64> =
        Sport::ALL.iter().map(|s| (s.as_str(), 0)).collect();

    let mut stmt =
        conn.prepare("SELECT sport, COUNT(*) FROM venues WHERE is_active = 1 GROUP BY sport")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (sport, count) = row?;
        if let Some(sport) = Sport::parse(&sport) {
            sports.insert(sport.as_str(), count);
        }
    }

    Ok(CatalogStats {
        total_venues,
        total_bookings,
        active_bookings,
        sports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn venue(id: &str, name: &str, sport: Sport, rating: f64) -> Venue {
        let now = Utc::now().naive_utc();
        Venue {
            id: id.to_string(),
            name: name.to_string(),
            sport,
            location: "Koramangala, Bangalore".to_string(),
            price_per_hour: 500.0,
            capacity: 4,
            facilities: vec!["AC Courts".to_string(), "Parking".to_string()],
            rating,
            image: "https://example.com/court.jpg".to_string(),
            description: "Air-conditioned courts".to_string(),
            open_time: "06:00".to_string(),
            close_time: "22:00".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn booking(id: &str, venue_id: &str, date: &str, slot: &str) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            venue_id: venue_id.to_string(),
            venue_name: "Court".to_string(),
            sport: Sport::Badminton,
            date: date.to_string(),
            time_slot: slot.to_string(),
            customer_name: "Asha".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "9876543210".to_string(),
            price: 500.0,
            payment_status: PaymentStatus::Pending,
            reminder_sent: false,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_venue_round_trip() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();

        let loaded = get_venue(&conn, "v1").unwrap().unwrap();
        assert_eq!(loaded.name, "Ace Club");
        assert_eq!(loaded.sport, Sport::Badminton);
        assert_eq!(loaded.facilities, vec!["AC Courts", "Parking"]);
        assert!(loaded.is_active);
        assert!(get_venue(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();
        insert_venue(&conn, &venue("v2", "City Center", Sport::Badminton, 4.9)).unwrap();
        insert_venue(&conn, &venue("v3", "Royal Arena", Sport::Cricket, 4.8)).unwrap();
        let mut hidden = venue("v4", "Old Ground", Sport::Cricket, 5.0);
        hidden.is_active = false;
        insert_venue(&conn, &hidden).unwrap();

        let all: Vec<String> = list_active_venues(&conn, None, None)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(all, vec!["v2", "v3", "v1"]);

        let cricket = list_active_venues(&conn, Some(Sport::Cricket), None).unwrap();
        assert_eq!(cricket.len(), 1);
        assert_eq!(cricket[0].id, "v3");

        let searched = list_active_venues(&conn, None, Some("ROYAL")).unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].id, "v3");

        let by_location = list_active_venues(&conn, None, Some("koramangala")).unwrap();
        assert_eq!(by_location.len(), 3);

        let wildcard = list_active_venues(&conn, None, Some("%")).unwrap();
        assert!(wildcard.is_empty());
    }

    #[test]
    fn test_duplicate_active_slot_rejected_by_index() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();

        let first = insert_booking(&conn, &booking("b1", "v1", "2025-06-01", "07:00")).unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = insert_booking(&conn, &booking("b2", "v1", "2025-06-01", "07:00")).unwrap();
        assert_eq!(second, InsertOutcome::SlotTaken);

        let other_slot = insert_booking(&conn, &booking("b3", "v1", "2025-06-01", "08:00")).unwrap();
        assert_eq!(other_slot, InsertOutcome::Inserted);
    }

    #[test]
    fn test_cancelled_booking_releases_slot() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();
        insert_booking(&conn, &booking("b1", "v1", "2025-06-01", "07:00")).unwrap();

        assert!(update_booking_status(&conn, "b1", BookingStatus::Cancelled).unwrap());
        assert!(find_active_booking(&conn, "v1", "2025-06-01", "07:00").unwrap().is_none());
        assert!(get_booked_slots(&conn, "v1", "2025-06-01").unwrap().is_empty());

        let rebooked = insert_booking(&conn, &booking("b2", "v1", "2025-06-01", "07:00")).unwrap();
        assert_eq!(rebooked, InsertOutcome::Inserted);
    }

    #[test]
    fn test_unknown_venue_is_not_a_slot_conflict() {
        let conn = setup_db();
        let result = insert_booking(&conn, &booking("b1", "ghost", "2025-06-01", "07:00"));
        assert!(result.is_err());
    }

    #[test]
    fn test_due_reminders_and_marking() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();
        insert_booking(&conn, &booking("b1", "v1", "2025-06-02", "07:00")).unwrap();
        insert_booking(&conn, &booking("b2", "v1", "2025-06-02", "08:00")).unwrap();
        insert_booking(&conn, &booking("b3", "v1", "2025-06-03", "07:00")).unwrap();
        update_booking_status(&conn, "b2", BookingStatus::Cancelled).unwrap();

        let due = get_due_reminders(&conn, "2025-06-02").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "b1");

        assert!(mark_reminder_sent(&conn, "b1").unwrap());
        assert!(get_due_reminders(&conn, "2025-06-02").unwrap().is_empty());
        assert!(get_booking_by_id(&conn, "b1").unwrap().unwrap().reminder_sent);
    }

    #[test]
    fn test_list_bookings_by_email_newest_first() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();
        insert_booking(&conn, &booking("b1", "v1", "2025-06-01", "07:00")).unwrap();
        insert_booking(&conn, &booking("b2", "v1", "2025-06-01", "08:00")).unwrap();
        let mut other = booking("b3", "v1", "2025-06-01", "09:00");
        other.customer_email = "ravi@example.com".to_string();
        insert_booking(&conn, &other).unwrap();

        let ids: Vec<String> = list_bookings(&conn, Some("asha@example.com"))
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b2", "b1"]);
        assert_eq!(list_bookings(&conn, None).unwrap().len(), 3);
    }

    #[test]
    fn test_catalog_stats() {
        let conn = setup_db();
        insert_venue(&conn, &venue("v1", "Ace Club", Sport::Badminton, 4.7)).unwrap();
        insert_venue(&conn, &venue("v2", "Royal Arena", Sport::Cricket, 4.8)).unwrap();
        let mut hidden = venue("v3", "Old Ground", Sport::Cricket, 5.0);
        hidden.is_active = false;
        insert_venue(&conn, &hidden).unwrap();
        insert_booking(&conn, &booking("b1", "v1", "2025-06-01", "07:00")).unwrap();
        insert_booking(&conn, &booking("b2", "v1", "2025-06-01", "08:00")).unwrap();
        update_booking_status(&conn, "b2", BookingStatus::Cancelled).unwrap();

        let stats = get_catalog_stats(&conn).unwrap();
        assert_eq!(stats.total_venues, 2);
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.active_bookings, 1);
        assert_eq!(stats.sports["cricket"], 1);
        assert_eq!(stats.sports["badminton"], 1);
        assert_eq!(stats.sports["tennis"], 0);
        assert_eq!(stats.sports["football"], 0);
        assert_eq!(count_venues(&conn).unwrap(), 3);
    }
}
