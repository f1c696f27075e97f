//! Event channel factories and handles.

use super::types::{EmailEvent, MeetingRoomEvent};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// Enough to absorb webhook bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for EmailEvent events.
pub type EmailEventSender = mpsc::Sender<EmailEvent>;
/// Receiver handle for EmailEvent events.
pub type EmailEventReceiver = mpsc::Receiver<EmailEvent>;

/// Sender handle for MeetingRoomEvent events.
pub type MeetingRoomEventSender = mpsc::Sender<MeetingRoomEvent>;
/// Receiver handle for MeetingRoomEvent events.
pub type MeetingRoomEventReceiver = mpsc::Receiver<MeetingRoomEvent>;

/// Create a new EmailEvent channel.
pub fn email_event_channel() -> (EmailEventSender, EmailEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new MeetingRoomEvent channel.
pub fn meeting_room_event_channel() -> (MeetingRoomEventSender, MeetingRoomEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Container for all event channel senders.
///
/// Handlers that emit events receive this instead of individual senders.
#[derive(Clone)]
pub struct EventSenders {
    /// Sender for EmailEvent events
    pub email: EmailEventSender,
    /// Sender for MeetingRoomEvent events
    pub meeting_room: MeetingRoomEventSender,
}

impl EventSenders {
    /// Create a new EventSenders container.
    pub fn new(email: EmailEventSender, meeting_room: MeetingRoomEventSender) -> Self {
        Self {
            email,
            meeting_room,
        }
    }
}
