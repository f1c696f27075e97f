//! Earnings listing and payout-bucket aggregation.

use axum::{Json, extract::Query, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use olb_core::entities::bookings::{GetEarningsTotals, ListEarningRecords};
use olb_core::framework::DatabaseProcessor;
use olb_sdk::objects::{EarningRow, EarningsRange, EarningsResponse, EarningsSummary};
use serde::Deserialize;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::api::extractors::AuthedTeacher;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EarningsQuery {
    range: Option<String>,
    search: Option<String>,
}

/// Half-open `[since, until)` bounds for a range, relative to `now`.
fn range_bounds(
    range: EarningsRange,
    now: OffsetDateTime,
) -> Option<(Option<PrimitiveDateTime>, Option<PrimitiveDateTime>)> {
    let now_utc = olb_core::scheduling::to_utc(now);
    match range {
        EarningsRange::Last7Days => Some((Some(now_utc - time::Duration::days(7)), None)),
        EarningsRange::Last30Days => Some((Some(now_utc - time::Duration::days(30)), None)),
        EarningsRange::Year(year) => {
            let since = Date::from_calendar_date(year, Month::January, 1).ok()?;
            let until = Date::from_calendar_date(year + 1, Month::January, 1).ok()?;
            Some((
                Some(PrimitiveDateTime::new(since, Time::MIDNIGHT)),
                Some(PrimitiveDateTime::new(until, Time::MIDNIGHT)),
            ))
        }
    }
}

/// `GET /api/teacher/earnings?range=last7|last30|{year}&search=`.
///
/// Lists completed bookings (both parties confirmed) in the range together
/// with the aggregated payout buckets.
pub async fn report(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Query(query): Query<EarningsQuery>,
) -> Result<impl IntoResponse, EarningsApiError> {
    let (since, until) = match query.range.as_deref() {
        None | Some("") => (None, None),
        Some(raw) => {
            let range: EarningsRange =
                raw.parse().map_err(|_| EarningsApiError::InvalidRange)?;
            range_bounds(range, OffsetDateTime::now_utc())
                .ok_or(EarningsApiError::InvalidRange)?
        }
    };

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let totals = processor
        .process(GetEarningsTotals {
            teacher_id: teacher.teacher_id,
            since,
            until,
        })
        .await?;
    let mut records = processor
        .process(ListEarningRecords {
            teacher_id: teacher.teacher_id,
            since,
            until,
        })
        .await?;

    if let Some(needle) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = needle.to_lowercase();
        records.retain(|r| {
            r.student_name.to_lowercase().contains(&needle)
                || r.lesson_title.to_lowercase().contains(&needle)
        });
    }

    let response = EarningsResponse {
        bookings: records
            .iter()
            .map(|r| EarningRow {
                booking_id: r.booking_id,
                lesson_title: r.lesson_title.clone(),
                student_name: r.student_name.clone(),
                starts_at: r.starts_at.assume_utc(),
                total_amount: r.total_amount,
                teacher_earning: r.teacher_earning,
                provider_payment_id: r.provider_payment_id.clone(),
            })
            .collect(),
        summary: EarningsSummary {
            total_earnings: totals.total_earnings,
            pending_earnings: totals.pending_earnings,
            requested_earnings: totals.requested_earnings,
            approved_earnings: totals.approved_earnings,
        },
    };
    Ok(Json(response))
}

/// Errors that can occur in earnings handlers.
#[derive(Debug)]
pub enum EarningsApiError {
    Database(sqlx::Error),
    InvalidRange,
}

impl From<sqlx::Error> for EarningsApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for EarningsApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            EarningsApiError::Database(e) => {
                tracing::error!(error = %e, "Earnings API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            EarningsApiError::InvalidRange => (
                StatusCode::BAD_REQUEST,
                "range must be last7, last30 or a year",
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn year_range_covers_the_calendar_year() {
        let (since, until) =
            range_bounds(EarningsRange::Year(2025), datetime!(2026-03-01 10:00 UTC)).unwrap();
        assert_eq!(since, Some(datetime!(2025-01-01 0:00)));
        assert_eq!(until, Some(datetime!(2026-01-01 0:00)));
    }

    #[test]
    fn last7_is_a_lower_bound_only() {
        let (since, until) =
            range_bounds(EarningsRange::Last7Days, datetime!(2026-03-08 12:00 UTC)).unwrap();
        assert_eq!(since, Some(datetime!(2026-03-01 12:00)));
        assert_eq!(until, None);
    }
}
