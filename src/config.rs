use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Base URL of the web client, used for links inside emails.
    pub public_url: String,
    /// Transactional mail endpoint. Empty means emails are only logged.
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from_name: String,
    pub mail_from_email: String,
    pub reminder_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "turfbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Turfbook".to_string()),
            mail_from_email: env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@turfbook.local".to_string()),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(3600),
        }
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }
}
