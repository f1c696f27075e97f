//! Booking listing objects.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Filter for `GET /api/teacher/bookings?period=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingPeriod {
    /// Bookings starting after now, ascending.
    Upcoming,
    /// Bookings starting at or before now, descending.
    Past,
}

/// A booking as listed to its teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub student_name: String,
    pub lesson_title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<CompactString>,
}
