//! Booking listing.

use axum::{Json, extract::Query, extract::State, http::StatusCode, response::IntoResponse};
use compact_str::CompactString;
use kanau::processor::Processor;
use olb_core::entities::bookings::{BookingListing, ListTeacherBookings};
use olb_core::framework::DatabaseProcessor;
use olb_sdk::objects::{BookingPeriod, BookingResponse};
use serde::Deserialize;

use crate::api::extractors::AuthedTeacher;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_period")]
    period: BookingPeriod,
    search: Option<String>,
}

fn default_period() -> BookingPeriod {
    BookingPeriod::Upcoming
}

fn matches_search(listing: &BookingListing, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    listing.student_name.to_lowercase().contains(&needle)
        || listing.lesson_title.to_lowercase().contains(&needle)
}

fn to_response(listing: &BookingListing) -> BookingResponse {
    BookingResponse {
        id: listing.id,
        student_id: listing.student_id,
        lesson_id: listing.lesson_id,
        student_name: listing.student_name.clone(),
        lesson_title: listing.lesson_title.clone(),
        starts_at: listing.starts_at.assume_utc(),
        ends_at: listing.ends_at.assume_utc(),
        total_amount: listing.total_amount,
        teacher_earning: listing.teacher_earning,
        cancelled: listing.cancelled,
        meeting_id: listing.meeting_id.as_deref().map(CompactString::from),
    }
}

/// `GET /api/teacher/bookings?period=upcoming|past&search=`.
///
/// Upcoming sorts soonest-first, past most-recent-first. The search term
/// filters by student name or lesson title.
pub async fn list(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, BookingApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let mut listings = processor
        .process(ListTeacherBookings {
            teacher_id: teacher.teacher_id,
            period: query.period,
        })
        .await?;

    if let Some(needle) = query.search.as_deref().filter(|s| !s.is_empty()) {
        listings.retain(|l| matches_search(l, needle));
    }

    if listings.is_empty() {
        return Err(BookingApiError::NoBookings);
    }

    let response: Vec<BookingResponse> = listings.iter().map(to_response).collect();
    Ok(Json(response))
}

/// Errors that can occur in booking handlers.
#[derive(Debug)]
pub enum BookingApiError {
    Database(sqlx::Error),
    NoBookings,
}

impl From<sqlx::Error> for BookingApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for BookingApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            BookingApiError::Database(e) => {
                tracing::error!(error = %e, "Booking API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            BookingApiError::NoBookings => {
                (StatusCode::NOT_FOUND, "no bookings found").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use uuid::Uuid;

    fn listing(student: &str, lesson: &str) -> BookingListing {
        BookingListing {
            id: Uuid::from_u128(1),
            student_id: Uuid::from_u128(2),
            lesson_id: Uuid::from_u128(3),
            student_name: student.into(),
            lesson_title: lesson.into(),
            starts_at: datetime!(2026-03-01 10:00),
            ends_at: datetime!(2026-03-01 11:00),
            total_amount: Decimal::new(4500, 2),
            teacher_earning: Decimal::new(4050, 2),
            cancelled: false,
            meeting_id: None,
        }
    }

    #[test]
    fn search_matches_either_field_case_insensitively() {
        let l = listing("Kim Lee", "Business English");
        assert!(matches_search(&l, "kim"));
        assert!(matches_search(&l, "ENGLISH"));
        assert!(!matches_search(&l, "french"));
    }
}
