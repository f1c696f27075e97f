//! Event type definitions.
//!
//! Events are idempotent and ephemeral. They carry identifiers rather than
//! full data; the consuming processors fetch current state from the
//! database at handling time.

use compact_str::CompactString;
use uuid::Uuid;

/// A notification that should be delivered by email.
///
/// Emitted by request handlers and the payment webhook after the database
/// writes commit, never inside a transaction.
#[derive(Debug, Clone)]
pub enum EmailEvent {
    /// A booking was confirmed by a completed payment. Both the student and
    /// the teacher are notified.
    BookingConfirmed { booking_id: Uuid },
    /// A bulk-lesson pack was purchased. Both parties are notified.
    BulkLessonPurchased { pack_id: Uuid },
    /// A teacher offered a special slot; the student receives the signed
    /// share link. The link is minted at emit time because only the
    /// handler holds the link secret.
    SpecialSlotInvite { slot_id: Uuid, share_link: String },
}

/// Occupancy change of a meeting room, derived from meeting-provider
/// webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingRoomEvent {
    /// The last participant left; the janitor may close the room after a
    /// grace period.
    Emptied { meeting_id: CompactString },
    /// Someone is (still) in the room; any pending close timer is void.
    Occupied { meeting_id: CompactString },
}

impl MeetingRoomEvent {
    pub fn meeting_id(&self) -> &CompactString {
        match self {
            MeetingRoomEvent::Emptied { meeting_id } => meeting_id,
            MeetingRoomEvent::Occupied { meeting_id } => meeting_id,
        }
    }
}
