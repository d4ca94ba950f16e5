pub mod booking;
pub mod mail;
pub mod notifications;
pub mod reminders;
