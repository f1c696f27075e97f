//! MeetingJanitor processor.
//!
//! Receives `MeetingRoomEvent` occupancy changes. An emptied room starts an
//! in-memory timer; if nobody rejoins within the grace period and the
//! owning booking's end time has passed, the room is ended through the
//! meeting client. Timers do not survive a restart — an abandoned room then
//! simply stays open until the provider's own idle cleanup.

use crate::entities::bookings::GetBookingEndByMeetingId;
use crate::events::channels::MeetingRoomEventReceiver;
use crate::events::types::MeetingRoomEvent;
use crate::framework::DatabaseProcessor;
use crate::meetings::MeetingClient;
use crate::scheduling::to_utc;
use compact_str::CompactString;
use kanau::processor::Processor;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use time::PrimitiveDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How long a room may sit empty before the janitor acts.
pub const EMPTY_ROOM_GRACE: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// A room may only be closed once its lesson is over; an empty room in the
/// middle of a lesson means a dropped connection, not an abandoned lesson.
pub fn may_close(booking_end: PrimitiveDateTime, now: PrimitiveDateTime) -> bool {
    booking_end <= now
}

pub struct MeetingJanitor {
    pool: PgPool,
    client: Arc<MeetingClient>,
    room_rx: MeetingRoomEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
    timers: HashMap<CompactString, JoinHandle<()>>,
}

impl MeetingJanitor {
    pub fn new(
        pool: PgPool,
        client: Arc<MeetingClient>,
        room_rx: MeetingRoomEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pool,
            client,
            room_rx,
            shutdown_rx,
            timers: HashMap::new(),
        }
    }

    /// Run the MeetingJanitor.
    pub async fn run(mut self) {
        info!("MeetingJanitor started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("MeetingJanitor received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.room_rx.recv() => {
                    debug!(event = ?event, "Received MeetingRoomEvent");
                    self.handle_event(event);
                }

                else => {
                    info!("MeetingRoomEvent channel closed");
                    break;
                }
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.abort();
        }

        info!("MeetingJanitor shutdown complete");
    }

    fn handle_event(&mut self, event: MeetingRoomEvent) {
        // Fired timers leave a finished handle behind; drop them so the map
        // stays bounded by the number of currently pending timers.
        self.timers.retain(|_, timer| !timer.is_finished());

        // Either way an existing timer for the room is stale.
        if let Some(timer) = self.timers.remove(event.meeting_id()) {
            timer.abort();
        }

        match event {
            MeetingRoomEvent::Occupied { meeting_id } => {
                debug!(%meeting_id, "room occupied, timer cancelled");
            }
            MeetingRoomEvent::Emptied { meeting_id } => {
                let pool = self.pool.clone();
                let client = Arc::clone(&self.client);
                let id = meeting_id.clone();
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(EMPTY_ROOM_GRACE).await;
                    Self::close_if_over(pool, client, id).await;
                });
                self.timers.insert(meeting_id, timer);
            }
        }
    }

    async fn close_if_over(pool: PgPool, client: Arc<MeetingClient>, meeting_id: CompactString) {
        let db = DatabaseProcessor { pool };
        let booking = match db.process(GetBookingEndByMeetingId(meeting_id.clone())).await {
            Ok(b) => b,
            Err(e) => {
                error!(%meeting_id, error = %e, "Failed to look up booking for emptied room");
                return;
            }
        };

        let Some(booking) = booking else {
            warn!(%meeting_id, "emptied room has no booking, leaving it alone");
            return;
        };

        let now = to_utc(time::OffsetDateTime::now_utc());
        if !may_close(booking.ends_at, now) {
            debug!(%meeting_id, "lesson still running, room stays open");
            return;
        }

        match client.end_meeting(&meeting_id).await {
            Ok(()) => info!(%meeting_id, "ended abandoned meeting room"),
            Err(e) => warn!(%meeting_id, error = %e, "Failed to end meeting room"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::events::channels::meeting_room_event_channel;
    use crate::meetings::MeetingCredentials;
    use url::Url;

    #[test]
    fn rooms_close_only_after_the_lesson_ends() {
        use time::macros::datetime;
        let end = datetime!(2026-03-01 11:00);
        assert!(!may_close(end, datetime!(2026-03-01 10:59)));
        assert!(may_close(end, datetime!(2026-03-01 11:00)));
        assert!(may_close(end, datetime!(2026-03-01 11:30)));
    }

    fn janitor() -> MeetingJanitor {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/olb")
            .unwrap();
        let client = Arc::new(MeetingClient::new(
            Url::parse("https://api.example.com/v2").unwrap(),
            Url::parse("https://auth.example.com/oauth/token").unwrap(),
            MeetingCredentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                account_id: "acct".into(),
            },
        ));
        let (_tx, rx) = meeting_room_event_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        MeetingJanitor::new(pool, client, rx, shutdown_rx)
    }

    #[tokio::test]
    async fn fired_timers_are_pruned_on_the_next_event() {
        let mut janitor = janitor();

        let done = tokio::spawn(async {});
        done.abort();
        while !done.is_finished() {
            tokio::task::yield_now().await;
        }
        janitor.timers.insert(CompactString::from("81234"), done);

        janitor.handle_event(MeetingRoomEvent::Occupied {
            meeting_id: CompactString::from("99999"),
        });
        assert!(!janitor.timers.contains_key("81234"));

        // A pending Emptied timer survives the prune.
        janitor.handle_event(MeetingRoomEvent::Emptied {
            meeting_id: CompactString::from("55555"),
        });
        janitor.handle_event(MeetingRoomEvent::Occupied {
            meeting_id: CompactString::from("99999"),
        });
        assert!(janitor.timers.contains_key("55555"));
    }
}
