//! Detached delivery of booking emails.
//!
//! Callers hand a [`Notification`] to the [`Notifier`] and move on. A worker
//! task drains the queue and sends every email in its own task, once. Failed
//! sends are logged here and never reach the caller. On shutdown the worker
//! returns only after every queued and in-flight send has finished.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::models::{Booking, Venue};
use crate::services::mail::{templates, Email, Mailer};

#[derive(Debug, Clone)]
pub enum Notification {
    BookingConfirmed { booking: Booking, venue: Venue },
    BookingCancelled { booking: Booking, venue: Venue },
}

struct Envelope {
    kind: &'static str,
    booking_id: String,
    email: Email,
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Envelope>,
    public_url: String,
}

impl Notifier {
    /// Starts the delivery worker. It runs until `shutdown` fires or every
    /// `Notifier` clone has been dropped.
    pub fn spawn(
        mailer: Arc<dyn Mailer>,
        public_url: String,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(mailer, rx, shutdown));
        (Self { tx, public_url }, handle)
    }

    pub fn notify(&self, notification: Notification) {
        let envelope = match notification {
            Notification::BookingConfirmed { booking, venue } => Envelope {
                kind: "confirmation",
                email: templates::booking_confirmation(&booking, &venue),
                booking_id: booking.id,
            },
            Notification::BookingCancelled { booking, venue } => Envelope {
                kind: "cancellation",
                email: templates::booking_cancellation(&booking, &venue, &self.public_url),
                booking_id: booking.id,
            },
        };

        if let Err(mpsc::error::SendError(envelope)) = self.tx.send(envelope) {
            tracing::error!(
                booking_id = %envelope.booking_id,
                kind = envelope.kind,
                "notification worker stopped, email dropped"
            );
        }
    }
}

async fn run_worker(
    mailer: Arc<dyn Mailer>,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    shutdown: CancellationToken,
) {
    tracing::info!("notification worker started");
    let sends = TaskTracker::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                rx.close();
                while let Some(envelope) = rx.recv().await {
                    dispatch(&sends, &mailer, envelope);
                }
                break;
            }
            received = rx.recv() => match received {
                Some(envelope) => dispatch(&sends, &mailer, envelope),
                None => break,
            },
        }
    }

    sends.close();
    if !sends.is_empty() {
        tracing::info!(pending = sends.len(), "waiting for in-flight notifications");
    }
    sends.wait().await;

    tracing::info!("notification worker stopped");
}

fn dispatch(sends: &TaskTracker, mailer: &Arc<dyn Mailer>, envelope: Envelope) {
    let mailer = Arc::clone(mailer);
    sends.spawn(async move {
        match mailer.send(&envelope.email).await {
            Ok(()) => tracing::info!(
                booking_id = %envelope.booking_id,
                kind = envelope.kind,
                "notification sent"
            ),
            Err(e) => tracing::error!(
                booking_id = %envelope.booking_id,
                kind = envelope.kind,
                error = %format!("{e:#}"),
                "notification failed"
            ),
        }
    });
}
