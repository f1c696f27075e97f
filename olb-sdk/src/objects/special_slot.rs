//! Special-slot objects.
//!
//! A special slot is a one-off offer a teacher extends to a specific
//! student outside declared availability. It is shared with the student
//! through a signed, time-limited public link.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Payment state of a special slot.
///
/// This is the API/DTO version without `sqlx::Type`. For database
/// operations, use the version in `olb-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPaymentStatus {
    Pending,
    Paid,
}

impl std::fmt::Display for SlotPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotPaymentStatus::Pending => write!(f, "pending"),
            SlotPaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Body of `POST /api/teacher/special-slots`. All fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialSlotRequest {
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// A special slot as listed to its teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialSlotResponse {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub payment_status: SlotPaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The public view behind a redeemed share link (`GET /api/slots/{token}`).
///
/// Display names only; no internal identifiers beyond the slot id the
/// student needs to check out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSlotView {
    pub id: Uuid,
    pub teacher_name: String,
    pub student_name: String,
    pub lesson_title: String,
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub payment_status: SlotPaymentStatus,
}

/// A lesson offered by the teacher, for special-slot creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogLesson {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub duration_minutes: i32,
}

/// A bookable student, for special-slot creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStudent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Response of `GET /api/teacher/catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub lessons: Vec<CatalogLesson>,
    pub students: Vec<CatalogStudent>,
}
