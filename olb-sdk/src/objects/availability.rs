//! Availability requests and the derived-schedule response.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /api/teacher/availability`.
///
/// Timestamps are RFC 3339 with offset; the server normalizes to UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAvailabilityRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// Body of `PUT /api/teacher/availability/{id}`. Either endpoint may be
/// updated independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub starts_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
}

/// A stored availability block as returned by mutation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBlockResponse {
    pub id: Uuid,
    pub teacher_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// A bookable sub-interval computed by the slot deriver.
///
/// `id` is present only when the slot is an entire availability block that
/// no booking intersects; derived fragments carry no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlotResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub teacher_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// A booked interval inside an availability block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlotResponse {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// Response of `GET /api/teacher/availability`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedScheduleResponse {
    pub availability_blocks: Vec<FreeSlotResponse>,
    pub booked_slots: Vec<BookedSlotResponse>,
}
