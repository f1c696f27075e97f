//! NotificationDispatcher processor.
//!
//! Receives `EmailEvent` from the queue, fetches current recipient data
//! from the database (events only carry ids), renders the templates and
//! delivers through the mailer with retries. Delivery failures are logged
//! and dropped; they never propagate back to request handlers.

use crate::emails;
use crate::entities::bookings::GetBookingNotification;
use crate::entities::bulk_lessons::GetBulkLessonNotification;
use crate::entities::special_slots::GetSharedSlot;
use crate::events::channels::EmailEventReceiver;
use crate::events::types::EmailEvent;
use crate::framework::DatabaseProcessor;
use crate::mailer::{EmailMessage, Mailer, MailerError};
use kanau::processor::Processor;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Attempts per message, with exponential backoff in between.
const MAX_SEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("mail delivery error: {0}")]
    Mailer(#[from] MailerError),

    /// The record behind the event vanished between emit and send.
    #[error("record {0} no longer exists")]
    RecordGone(Uuid),
}

pub struct NotificationDispatcher {
    db: DatabaseProcessor,
    mailer: Mailer,
    email_rx: EmailEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl NotificationDispatcher {
    pub fn new(
        db: DatabaseProcessor,
        mailer: Mailer,
        email_rx: EmailEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            db,
            mailer,
            email_rx,
            shutdown_rx,
        }
    }

    /// Run the NotificationDispatcher.
    pub async fn run(mut self) {
        info!("NotificationDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("NotificationDispatcher received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.email_rx.recv() => {
                    debug!(event = ?event, "Received EmailEvent");

                    if let Err(e) = self.process_event(event).await {
                        error!(error = %e, "Failed to process EmailEvent");
                    }
                }

                else => {
                    info!("EmailEvent channel closed");
                    break;
                }
            }
        }

        info!("NotificationDispatcher shutdown complete");
    }

    async fn process_event(&self, event: EmailEvent) -> Result<(), NotificationError> {
        let messages = self.render(event).await?;
        for message in messages {
            self.deliver(message).await;
        }
        Ok(())
    }

    /// Fetch the current state behind the event and render the messages.
    async fn render(&self, event: EmailEvent) -> Result<Vec<EmailMessage>, NotificationError> {
        match event {
            EmailEvent::BookingConfirmed { booking_id } => {
                let Some(n) = self.db.process(GetBookingNotification(booking_id)).await? else {
                    return Err(NotificationError::RecordGone(booking_id));
                };
                Ok(vec![
                    emails::booking_confirmed_student(&n),
                    emails::booking_confirmed_teacher(&n),
                ])
            }
            EmailEvent::BulkLessonPurchased { pack_id } => {
                let Some(n) = self.db.process(GetBulkLessonNotification(pack_id)).await? else {
                    return Err(NotificationError::RecordGone(pack_id));
                };
                Ok(vec![
                    emails::bulk_purchased_student(&n),
                    emails::bulk_purchased_teacher(&n),
                ])
            }
            EmailEvent::SpecialSlotInvite {
                slot_id,
                share_link,
            } => {
                let Some(slot) = self.db.process(GetSharedSlot(slot_id)).await? else {
                    return Err(NotificationError::RecordGone(slot_id));
                };
                Ok(vec![emails::special_slot_invite(&slot, &share_link)])
            }
        }
    }

    /// Try a message up to [`MAX_SEND_ATTEMPTS`] times; give up with a log.
    async fn deliver(&self, message: EmailMessage) {
        for attempt in 0..MAX_SEND_ATTEMPTS {
            match self.mailer.send(&message).await {
                Ok(()) => {
                    info!(to = %message.to, subject = %message.subject, "Email delivered");
                    return;
                }
                Err(e) if attempt + 1 < MAX_SEND_ATTEMPTS => {
                    warn!(
                        to = %message.to,
                        error = %e,
                        attempt = attempt + 1,
                        "Email delivery failed, will retry"
                    );
                    tokio::time::sleep(send_retry_delay(attempt)).await;
                }
                Err(e) => {
                    error!(
                        to = %message.to,
                        error = %e,
                        "Email delivery failed, giving up"
                    );
                }
            }
        }
    }
}

/// Backoff before the next attempt: 2^attempt seconds.
pub fn send_retry_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_secs(2u64.pow(attempt.min(MAX_SEND_ATTEMPTS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_retry_delay() {
        assert_eq!(send_retry_delay(0), std::time::Duration::from_secs(1));
        assert_eq!(send_retry_delay(1), std::time::Duration::from_secs(2));
        assert_eq!(send_retry_delay(2), std::time::Duration::from_secs(4));
        // Capped
        assert_eq!(send_retry_delay(50), std::time::Duration::from_secs(8));
    }
}
