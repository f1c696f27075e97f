//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use olb_core::events::channels::EventSenders;
use olb_core::meetings::MeetingClient;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (reloadable via SIGHUP).
    pub config: SharedConfig,
    /// Senders for background-processor events.
    pub events: EventSenders,
    /// Meeting-provider API client.
    pub meeting_client: Arc<MeetingClient>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: SharedConfig,
        events: EventSenders,
        meeting_client: Arc<MeetingClient>,
    ) -> Self {
        Self {
            db,
            config,
            events,
            meeting_client,
        }
    }
}
