use crate::models::{Booking, Venue};

use super::Email;

pub fn booking_confirmation(booking: &Booking, venue: &Venue) -> Email {
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>Booking Confirmed!</h1>\
         <p>Hello {name},</p>\
         <p>Your booking for <strong>{venue}</strong> has been confirmed. Get your gear ready!</p>\
         <table>\
         <tr><td>Sport:</td><td>{sport}</td></tr>\
         <tr><td>Date:</td><td>{date}</td></tr>\
         <tr><td>Time Slot:</td><td>{slot}</td></tr>\
         <tr><td>Amount:</td><td>{price:.2}</td></tr>\
         </table>\
         <p>Location: {location}</p>\
         <p>Please arrive 10 minutes before your slot.</p>\
         </div>",
        name = escape(&booking.customer_name),
        venue = escape(&venue.name),
        sport = venue.sport.as_str(),
        date = escape(&booking.date),
        slot = escape(&booking.time_slot),
        price = booking.price,
        location = escape(&venue.location),
    );

    Email {
        to: booking.customer_email.clone(),
        subject: format!("Booking Confirmed: {} - {}", venue.name, booking.date),
        html,
    }
}

pub fn booking_cancellation(booking: &Booking, venue: &Venue, public_url: &str) -> Email {
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>Booking Cancelled</h1>\
         <p>Your booking for <strong>{venue}</strong> on {date} at {slot} has been successfully cancelled.</p>\
         <p>If this was a mistake, you can book again on our platform.</p>\
         <p><a href=\"{url}/turfs\">Book New Slot</a></p>\
         </div>",
        venue = escape(&venue.name),
        date = escape(&booking.date),
        slot = escape(&booking.time_slot),
        url = public_url.trim_end_matches('/'),
    );

    Email {
        to: booking.customer_email.clone(),
        subject: format!("Booking Cancelled: {}", venue.name),
        html,
    }
}

pub fn booking_reminder(booking: &Booking, venue: &Venue) -> Email {
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>Game Day Reminder!</h1>\
         <p>Your game at <strong>{venue}</strong> is coming up tomorrow!</p>\
         <p><strong>When:</strong> Tomorrow, {date} at {slot}</p>\
         <p>Location: {location}</p>\
         <p>Don't forget your gear. See you there!</p>\
         </div>",
        venue = escape(&venue.name),
        date = escape(&booking.date),
        slot = escape(&booking.time_slot),
        location = escape(&venue.location),
    );

    Email {
        to: booking.customer_email.clone(),
        subject: format!("Reminder: {} tomorrow at {}", venue.name, booking.time_slot),
        html,
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus, Sport};
    use chrono::NaiveDateTime;

    fn fixtures() -> (Booking, Venue) {
        let ts = NaiveDateTime::parse_from_str("2025-05-20 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let venue = Venue {
            id: "v1".to_string(),
            name: "Green Valley Cricket Ground".to_string(),
            sport: Sport::Cricket,
            location: "Sector 21, Bangalore".to_string(),
            price_per_hour: 1500.0,
            capacity: 22,
            facilities: vec![],
            rating: 4.5,
            image: "https://example.com/g.jpg".to_string(),
            description: "Ground".to_string(),
            open_time: "06:00".to_string(),
            close_time: "22:00".to_string(),
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };
        let booking = Booking {
            id: "b1".to_string(),
            venue_id: "v1".to_string(),
            venue_name: venue.name.clone(),
            sport: Sport::Cricket,
            date: "2025-06-01".to_string(),
            time_slot: "07:00".to_string(),
            customer_name: "Asha <script>".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "9876543210".to_string(),
            price: 1500.0,
            payment_status: PaymentStatus::Pending,
            reminder_sent: false,
            status: BookingStatus::Confirmed,
            created_at: ts,
            updated_at: ts,
        };
        (booking, venue)
    }

    #[test]
    fn test_confirmation() {
        let (booking, venue) = fixtures();
        let email = booking_confirmation(&booking, &venue);
        assert_eq!(email.to, "asha@example.com");
        assert_eq!(email.subject, "Booking Confirmed: Green Valley Cricket Ground - 2025-06-01");
        assert!(email.html.contains("cricket"));
        assert!(email.html.contains("07:00"));
        assert!(email.html.contains("1500.00"));
        assert!(email.html.contains("Sector 21, Bangalore"));
        assert!(email.html.contains("Asha &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn test_cancellation_links_catalog() {
        let (booking, venue) = fixtures();
        let email = booking_cancellation(&booking, &venue, "https://turfbook.example/");
        assert_eq!(email.subject, "Booking Cancelled: Green Valley Cricket Ground");
        assert!(email.html.contains("href=\"https://turfbook.example/turfs\""));
        assert!(email.html.contains("on 2025-06-01 at 07:00"));
    }

    #[test]
    fn test_reminder() {
        let (booking, venue) = fixtures();
        let email = booking_reminder(&booking, &venue);
        assert_eq!(email.subject, "Reminder: Green Valley Cricket Ground tomorrow at 07:00");
        assert!(email.html.contains("Tomorrow, 2025-06-01 at 07:00"));
    }
}
