//! Fixtures shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::db::{self, queries};
use crate::models::{Sport, Venue};
use crate::services::mail::{Email, Mailer};
use crate::services::notifications::Notifier;
use crate::state::AppState;

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
    /// Emails to this address fail.
    pub fail_for: Option<String>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) -> Vec<Email> {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        if self.fail_for.as_deref() == Some(email.to.as_str()) {
            anyhow::bail!("mailbox unavailable: {}", email.to);
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        port: 5000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        public_url: "http://localhost:3000".to_string(),
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from_name: "Turfbook".to_string(),
        mail_from_email: "no-reply@turfbook.local".to_string(),
        reminder_interval_secs: 3600,
    }
}

/// Must be called inside a tokio runtime; the notifier worker is spawned.
pub fn test_state(mailer: Arc<RecordingMailer>) -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let (notifier, _worker) =
        Notifier::spawn(mailer.clone(), config.public_url.clone(), CancellationToken::new());
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        mailer,
        notifier,
    })
}

pub fn venue(id: &str, open_time: &str, close_time: &str) -> Venue {
    let now = Utc::now().naive_utc();
    Venue {
        id: id.to_string(),
        name: format!("Venue {id}"),
        sport: Sport::Football,
        location: "HSR Layout".to_string(),
        price_per_hour: 1200.0,
        capacity: 10,
        facilities: vec!["Floodlights".to_string()],
        rating: 4.0,
        image: "https://example.com/turf.jpg".to_string(),
        description: "Five-a-side turf".to_string(),
        open_time: open_time.to_string(),
        close_time: close_time.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn add_venue(state: &AppState, venue: &Venue) {
    let db = state.db.lock().unwrap();
    queries::insert_venue(&db, venue).unwrap();
}
