pub mod availability;
pub mod booking;
pub mod venue;

pub use availability::Slot;
pub use booking::{Booking, BookingStatus, DisplayStatus, NewBooking, PaymentStatus, ValidBooking};
pub use venue::{NewVenue, Sport, Venue, VenueUpdate};
