use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::venue::Sport;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub venue_id: String,
    /// Venue name and sport as they were when the booking was made.
    pub venue_name: String,
    pub sport: Sport,
    /// Plain calendar date, "YYYY-MM-DD".
    pub date: String,
    /// Slot start, "HH:00".
    pub time_slot: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub price: f64,
    pub payment_status: PaymentStatus,
    pub reminder_sent: bool,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

/// Status as shown to a reader. `Completed` is never stored.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    /// Start of the booked hour. `None` if the stored date or slot is malformed.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let date = parse_date(&self.date)?;
        let time = NaiveTime::parse_from_str(&self.time_slot, "%H:%M").ok()?;
        Some(date.and_time(time))
    }

    pub fn display_status(&self, now: NaiveDateTime) -> DisplayStatus {
        match self.status {
            BookingStatus::Cancelled => DisplayStatus::Cancelled,
            BookingStatus::Confirmed => match self.starts_at() {
                Some(start) if start <= now => DisplayStatus::Completed,
                _ => DisplayStatus::Confirmed,
            },
        }
    }
}

/// Request body for claiming a slot. Fields are optional so that missing
/// values surface as validation errors rather than body rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub venue_id: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

/// A `NewBooking` with every field present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub venue_id: String,
    pub date: String,
    pub time_slot: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl NewBooking {
    pub fn validate(self) -> Result<ValidBooking, String> {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let (
            Some(venue_id),
            Some(date),
            Some(time_slot),
            Some(customer_name),
            Some(customer_email),
            Some(customer_phone),
        ) = (
            present(self.venue_id),
            present(self.date),
            present(self.time_slot),
            present(self.customer_name),
            present(self.customer_email),
            present(self.customer_phone),
        )
        else {
            return Err("All fields are required".to_string());
        };

        if parse_date(&date).is_none() {
            return Err(format!("invalid date: {date}, expected YYYY-MM-DD"));
        }
        if !is_valid_email(&customer_email) {
            return Err("Please fill a valid email address".to_string());
        }

        Ok(ValidBooking {
            venue_id,
            date,
            time_slot,
            customer_name,
            customer_email,
            customer_phone,
        })
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_PATTERN.is_match(s)
}
