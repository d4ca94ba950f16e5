//! Day-before reminder emails.
//!
//! [`ReminderScheduler::start`] runs [`sweep`] on a fixed period until the
//! returned handle is stopped. A booking is flagged `reminder_sent` only after
//! its email went out, so a failed send is retried on the next tick and a sent
//! reminder is never repeated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::db::queries;
use crate::services::mail::templates;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Sends reminders for confirmed, unreminded bookings dated the day after
/// `today`. Bookings are handled one by one; a failure is logged and the
/// sweep moves on to the next booking.
pub async fn sweep(state: &AppState, today: NaiveDate) -> anyhow::Result<SweepReport> {
    let Some(tomorrow) = today.checked_add_days(Days::new(1)) else {
        anyhow::bail!("no calendar day after {today}");
    };
    let tomorrow = tomorrow.format("%Y-%m-%d").to_string();

    let due = {
        let db = state.db()?;
        queries::get_due_reminders(&db, &tomorrow)?
    };

    let mut report = SweepReport {
        due: due.len(),
        ..Default::default()
    };
    tracing::info!(date = %tomorrow, due = report.due, "running reminder sweep");

    for booking in due {
        let venue = {
            let db = state.db()?;
            queries::get_venue(&db, &booking.venue_id)
        };
        let venue = match venue {
            Ok(Some(venue)) => venue,
            Ok(None) => {
                tracing::warn!(booking_id = %booking.id, venue_id = %booking.venue_id, "venue missing, reminder skipped");
                report.failed += 1;
                continue;
            }
            Err(e) => {
                tracing::error!(booking_id = %booking.id, error = %format!("{e:#}"), "failed to load venue for reminder");
                report.failed += 1;
                continue;
            }
        };

        let email = templates::booking_reminder(&booking, &venue);
        if let Err(e) = state.mailer.send(&email).await {
            tracing::error!(booking_id = %booking.id, error = %format!("{e:#}"), "reminder email failed");
            report.failed += 1;
            continue;
        }

        let marked = {
            let db = state.db()?;
            queries::mark_reminder_sent(&db, &booking.id)
        };
        match marked {
            Ok(_) => {
                tracing::info!(booking_id = %booking.id, "reminder sent");
                report.sent += 1;
            }
            Err(e) => {
                tracing::error!(booking_id = %booking.id, error = %format!("{e:#}"), "reminder sent but not recorded");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

pub struct ReminderScheduler;

impl ReminderScheduler {
    /// Spawns the sweep loop. The first sweep runs immediately.
    pub fn start(state: Arc<AppState>, period: Duration) -> ReminderHandle {
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_loop(state, period, shutdown.clone()));
        ReminderHandle { shutdown, handle }
    }
}

pub struct ReminderHandle {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl ReminderHandle {
    /// Stops the loop and waits for it to finish. An in-flight sweep is
    /// abandoned at its next await point.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "reminder scheduler task failed");
        }
    }
}

async fn run_loop(state: Arc<AppState>, period: Duration, shutdown: CancellationToken) {
    tracing::info!(period_secs = period.as_secs(), "reminder scheduler started");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let today = Utc::now().date_naive();
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = sweep(&state, today) => match result {
                        Ok(report) => tracing::info!(
                            due = report.due,
                            sent = report.sent,
                            failed = report.failed,
                            "reminder sweep finished"
                        ),
                        Err(e) => tracing::error!(error = %format!("{e:#}"), "reminder sweep failed"),
                    },
                }
            }
        }
    }

    tracing::info!("reminder scheduler stopped");
}
