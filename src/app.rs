use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::db;
use crate::handlers;
use crate::services::mail::http::HttpMailer;
use crate::services::mail::{LogMailer, Mailer};
use crate::services::notifications::Notifier;
use crate::services::reminders::{ReminderHandle, ReminderScheduler};
use crate::state::AppState;

/// A running application: the HTTP router plus its background tasks.
pub struct App {
    pub state: Arc<AppState>,
    pub router: Router,
    reminders: ReminderHandle,
    notifier_worker: JoinHandle<()>,
    shutdown: CancellationToken,
}

pub fn mailer_from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    if config.mail_api_url.is_empty() {
        tracing::warn!("MAIL_API_URL not set, emails will only be logged");
        return Arc::new(LogMailer);
    }

    tracing::info!("using HTTP mailer (url: {})", config.mail_api_url);
    Arc::new(HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from_name.clone(),
        config.mail_from_email.clone(),
    ))
}

/// Opens the database and starts the background tasks. Must run inside a
/// tokio runtime. Errors are returned to the caller, which decides whether
/// they end the process.
pub fn build(config: AppConfig, mailer: Arc<dyn Mailer>) -> anyhow::Result<App> {
    let conn = db::init_db(&config.database_url)?;

    let shutdown = CancellationToken::new();
    let (notifier, notifier_worker) =
        Notifier::spawn(mailer.clone(), config.public_url.clone(), shutdown.clone());

    let period = config.reminder_interval();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        mailer,
        notifier,
    });

    let reminders = ReminderScheduler::start(state.clone(), period);
    let router = handlers::router(state.clone());

    Ok(App {
        state,
        router,
        reminders,
        notifier_worker,
        shutdown,
    })
}

impl App {
    pub async fn shutdown(self) {
        tracing::info!("shutting down background tasks");
        self.reminders.stop().await;
        self.shutdown.cancel();
        if let Err(e) = self.notifier_worker.await {
            tracing::error!(error = %e, "notification worker failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;

    #[tokio::test]
    async fn test_build_and_shutdown() {
        let app = build(test_config(), Arc::new(LogMailer)).unwrap();
        {
            let db = app.state.db.lock().unwrap();
            assert_eq!(db::queries::count_venues(&db).unwrap(), 0);
        }
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_database_is_returned() {
        let mut config = test_config();
        config.database_url = "/nonexistent-dir/turfbook.db".to_string();
        assert!(build(config, Arc::new(LogMailer)).is_err());
    }

    #[test]
    fn test_mailer_selection() {
        let mut config = test_config();
        let _log_only = mailer_from_config(&config);
        config.mail_api_url = "https://mail.example.com/send".to_string();
        let _http = mailer_from_config(&config);
    }
}
