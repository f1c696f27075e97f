//! Slot derivation and availability-window arithmetic.
//!
//! Pure interval logic over UTC timestamps; no database access. The
//! persistence layer supplies availability blocks and non-cancelled
//! bookings, and the API layer turns the derived windows back into wire
//! objects.

use itertools::Itertools;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// Gap appended after each booking before the next free slot may start.
pub const POST_LESSON_BUFFER: Duration = Duration::minutes(5);

/// A half-open `[starts_at, ends_at)` interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

impl Window {
    pub fn new(starts_at: PrimitiveDateTime, ends_at: PrimitiveDateTime) -> Self {
        Self { starts_at, ends_at }
    }

    /// `start < end`. Mutation endpoints must reject windows that are not.
    pub fn is_valid(&self) -> bool {
        self.starts_at < self.ends_at
    }

    /// Strict interval intersection: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Window) -> bool {
        other.ends_at > self.starts_at && other.starts_at < self.ends_at
    }

    /// Windows sharing exactly one endpoint.
    pub fn is_adjacent_to(&self, other: &Window) -> bool {
        self.ends_at == other.starts_at || self.starts_at == other.ends_at
    }
}

/// Convert an offset timestamp to its UTC wall-clock representation.
pub fn to_utc(t: OffsetDateTime) -> PrimitiveDateTime {
    let utc = t.to_offset(time::UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

/// An availability block as seen by the deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub id: Uuid,
    pub window: Window,
}

/// A confirmed booking as seen by the deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub window: Window,
}

/// A bookable sub-interval. `block_id` is preserved only when the slot is
/// an entire untouched availability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSlot {
    pub block_id: Option<Uuid>,
    pub window: Window,
}

/// A booked interval intersecting some availability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub window: Window,
}

/// Output of [`derive_schedule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedSchedule {
    pub free: Vec<FreeSlot>,
    pub booked: Vec<BookedSlot>,
}

/// Subtract bookings from availability blocks.
///
/// For each block: bookings intersecting it are sorted by start time and a
/// cursor walks the block from its start, emitting a free slot for every
/// gap before the next booking. After each booking the cursor advances to
/// `booking end + 5 minutes`, clamped so overlapping bookings never move it
/// backward. A trailing free slot is emitted if the cursor still precedes
/// the block end.
///
/// Callers must pass only non-cancelled bookings and well-formed blocks
/// (`start < end`). Overlapping bookings are not deduplicated beyond their
/// sort order.
pub fn derive_schedule(blocks: &[BlockWindow], bookings: &[BookingWindow]) -> DerivedSchedule {
    let mut schedule = DerivedSchedule::default();

    for block in blocks {
        let matching: Vec<&BookingWindow> = bookings
            .iter()
            .filter(|b| block.window.overlaps(&b.window))
            .sorted_by_key(|b| b.window.starts_at)
            .collect();

        // Untouched block passes through with its identity.
        if matching.is_empty() {
            schedule.free.push(FreeSlot {
                block_id: Some(block.id),
                window: block.window,
            });
            continue;
        }

        let mut cursor = block.window.starts_at;
        for booking in &matching {
            if cursor < booking.window.starts_at {
                schedule.free.push(FreeSlot {
                    block_id: None,
                    window: Window::new(cursor, booking.window.starts_at),
                });
            }
            let next_start = booking.window.ends_at + POST_LESSON_BUFFER;
            if next_start > cursor {
                cursor = next_start;
            }
        }

        if cursor < block.window.ends_at {
            schedule.free.push(FreeSlot {
                block_id: None,
                window: Window::new(cursor, block.window.ends_at),
            });
        }

        schedule.booked.extend(matching.iter().map(|b| BookedSlot {
            student_id: b.student_id,
            lesson_id: b.lesson_id,
            window: b.window,
        }));
    }

    schedule
}

// ---------------------------------------------------------------------------
// Merge-on-insert
// ---------------------------------------------------------------------------

/// Overlap against an existing availability block.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("window overlaps an existing availability block")]
pub struct WindowConflict;

/// Result of merging a new window into existing blocks: the (possibly
/// widened) window to store and the ids of absorbed adjacent blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub window: Window,
    pub absorbed: Vec<Uuid>,
}

/// Merge a new availability window into a teacher's existing blocks.
///
/// Rejects any overlap. Blocks that are exactly adjacent (shared endpoint)
/// are absorbed: the new window extends over them and their ids are
/// returned for deletion, keeping the per-teacher invariant that blocks
/// never overlap and never touch.
pub fn merge_window(existing: &[BlockWindow], new: Window) -> Result<MergeOutcome, WindowConflict> {
    if existing.iter().any(|b| b.window.overlaps(&new)) {
        return Err(WindowConflict);
    }

    let mut window = new;
    let mut absorbed = Vec::new();
    for block in existing {
        if new.is_adjacent_to(&block.window) {
            if block.window.starts_at < window.starts_at {
                window.starts_at = block.window.starts_at;
            }
            if block.window.ends_at > window.ends_at {
                window.ends_at = block.window.ends_at;
            }
            absorbed.push(block.id);
        }
    }

    Ok(MergeOutcome { window, absorbed })
}

/// Whether `window` overlaps any existing block. Special-slot creation uses
/// this to refuse offers inside declared availability.
pub fn overlaps_any(existing: &[BlockWindow], window: &Window) -> bool {
    existing.iter().any(|b| b.window.overlaps(window))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use time::macros::datetime;

    fn block(id: u128, start: PrimitiveDateTime, end: PrimitiveDateTime) -> BlockWindow {
        BlockWindow {
            id: Uuid::from_u128(id),
            window: Window::new(start, end),
        }
    }

    fn booking(start: PrimitiveDateTime, end: PrimitiveDateTime) -> BookingWindow {
        BookingWindow {
            student_id: Uuid::from_u128(100),
            lesson_id: Uuid::from_u128(200),
            window: Window::new(start, end),
        }
    }

    #[test]
    fn untouched_block_passes_through_with_id() {
        let b = block(7, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let schedule = derive_schedule(&[b], &[]);
        assert_eq!(
            schedule.free,
            vec![FreeSlot {
                block_id: Some(Uuid::from_u128(7)),
                window: b.window,
            }]
        );
        assert!(schedule.booked.is_empty());
    }

    #[test]
    fn fully_covered_block_yields_no_free_slots() {
        let b = block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let bk = booking(datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let schedule = derive_schedule(&[b], &[bk]);
        assert!(schedule.free.is_empty());
        assert_eq!(schedule.booked.len(), 1);
    }

    #[test]
    fn mid_block_booking_splits_with_buffer() {
        // Block 10:00-11:00, booking 10:15-10:30 -> free [10:00,10:15] and
        // [10:35,11:00] (5-minute buffer after the booking).
        let b = block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let bk = booking(datetime!(2026-03-01 10:15), datetime!(2026-03-01 10:30));
        let schedule = derive_schedule(&[b], &[bk]);

        let windows: Vec<Window> = schedule.free.iter().map(|s| s.window).collect();
        assert_eq!(
            windows,
            vec![
                Window::new(datetime!(2026-03-01 10:00), datetime!(2026-03-01 10:15)),
                Window::new(datetime!(2026-03-01 10:35), datetime!(2026-03-01 11:00)),
            ]
        );
        // Derived fragments carry no block identity.
        assert!(schedule.free.iter().all(|s| s.block_id.is_none()));
    }

    #[test]
    fn booking_at_block_start_leaves_only_trailing_slot() {
        let b = block(1, datetime!(2026-03-01 09:00), datetime!(2026-03-01 12:00));
        let bk = booking(datetime!(2026-03-01 09:00), datetime!(2026-03-01 10:00));
        let schedule = derive_schedule(&[b], &[bk]);
        assert_eq!(
            schedule.free,
            vec![FreeSlot {
                block_id: None,
                window: Window::new(datetime!(2026-03-01 10:05), datetime!(2026-03-01 12:00)),
            }]
        );
    }

    #[test]
    fn buffer_swallows_slivers_shorter_than_five_minutes() {
        // Booking ends 10:58; buffer pushes the cursor past 11:00.
        let b = block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let bk = booking(datetime!(2026-03-01 10:30), datetime!(2026-03-01 10:58));
        let schedule = derive_schedule(&[b], &[bk]);
        assert_eq!(schedule.free.len(), 1);
        assert_eq!(
            schedule.free[0].window,
            Window::new(datetime!(2026-03-01 10:00), datetime!(2026-03-01 10:30))
        );
    }

    #[test]
    fn overlapping_bookings_never_move_cursor_backward() {
        // Second booking ends before the first; its buffer must not rewind
        // the cursor into the first booking.
        let b = block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 12:00));
        let long = booking(datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:30));
        let short = booking(datetime!(2026-03-01 10:15), datetime!(2026-03-01 10:45));
        let schedule = derive_schedule(&[b], &[long, short]);
        assert_eq!(
            schedule.free,
            vec![FreeSlot {
                block_id: None,
                window: Window::new(datetime!(2026-03-01 11:35), datetime!(2026-03-01 12:00)),
            }]
        );
        assert_eq!(schedule.booked.len(), 2);
    }

    #[test]
    fn bookings_outside_block_are_ignored() {
        let b = block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let before = booking(datetime!(2026-03-01 08:00), datetime!(2026-03-01 09:00));
        let touching = booking(datetime!(2026-03-01 11:00), datetime!(2026-03-01 12:00));
        let schedule = derive_schedule(&[b], &[before, touching]);
        assert_eq!(schedule.free[0].block_id, Some(Uuid::from_u128(1)));
        assert!(schedule.booked.is_empty());
    }

    #[test]
    fn each_block_derived_independently() {
        let b1 = block(1, datetime!(2026-03-01 09:00), datetime!(2026-03-01 10:00));
        let b2 = block(2, datetime!(2026-03-01 14:00), datetime!(2026-03-01 16:00));
        let bk = booking(datetime!(2026-03-01 14:00), datetime!(2026-03-01 15:00));
        let schedule = derive_schedule(&[b1, b2], &[bk]);
        assert_eq!(schedule.free.len(), 2);
        assert_eq!(schedule.free[0].block_id, Some(Uuid::from_u128(1)));
        assert_eq!(
            schedule.free[1].window,
            Window::new(datetime!(2026-03-01 15:05), datetime!(2026-03-01 16:00))
        );
    }

    #[test]
    fn merge_rejects_overlap() {
        let existing = [block(1, datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00))];
        let new = Window::new(datetime!(2026-03-01 10:30), datetime!(2026-03-01 11:30));
        assert_eq!(merge_window(&existing, new), Err(WindowConflict));
    }

    #[test]
    fn merge_absorbs_adjacent_blocks_on_both_sides() {
        let existing = [
            block(1, datetime!(2026-03-01 09:00), datetime!(2026-03-01 10:00)),
            block(2, datetime!(2026-03-01 11:00), datetime!(2026-03-01 12:00)),
        ];
        let new = Window::new(datetime!(2026-03-01 10:00), datetime!(2026-03-01 11:00));
        let outcome = merge_window(&existing, new).unwrap();
        assert_eq!(
            outcome.window,
            Window::new(datetime!(2026-03-01 09:00), datetime!(2026-03-01 12:00))
        );
        assert_eq!(outcome.absorbed, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
    }

    #[test]
    fn merge_without_neighbours_keeps_window() {
        let existing = [block(1, datetime!(2026-03-01 09:00), datetime!(2026-03-01 10:00))];
        let new = Window::new(datetime!(2026-03-01 13:00), datetime!(2026-03-01 14:00));
        let outcome = merge_window(&existing, new).unwrap();
        assert_eq!(outcome.window, new);
        assert!(outcome.absorbed.is_empty());
    }

    #[test]
    fn to_utc_normalizes_offsets() {
        let tokyo = datetime!(2026-03-01 19:00 +9);
        assert_eq!(to_utc(tokyo), datetime!(2026-03-01 10:00));
    }
}
