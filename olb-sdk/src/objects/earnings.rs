//! Earnings aggregation objects.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Date filter for `GET /api/teacher/earnings?range=`.
///
/// Accepts `last7`, `last30`, or a bare year like `2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarningsRange {
    Last7Days,
    Last30Days,
    Year(i32),
}

impl FromStr for EarningsRange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last7" => Ok(Self::Last7Days),
            "last30" => Ok(Self::Last30Days),
            other => other.parse::<i32>().map(Self::Year).map_err(|_| ()),
        }
    }
}

/// Aggregated earnings of a teacher, bucketed by payout state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Sum of teacher earnings over all completed bookings in range.
    pub total_earnings: Decimal,
    /// Earnings with no payout requested yet.
    pub pending_earnings: Decimal,
    /// Earnings with a payout requested but not paid out.
    pub requested_earnings: Decimal,
    /// Earnings already paid out.
    pub approved_earnings: Decimal,
}

/// One completed booking in the earnings listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningRow {
    pub booking_id: Uuid,
    pub lesson_title: String,
    pub student_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub provider_payment_id: String,
}

/// Response of `GET /api/teacher/earnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsResponse {
    pub bookings: Vec<EarningRow>,
    pub summary: EarningsSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parsing() {
        assert_eq!("last7".parse(), Ok(EarningsRange::Last7Days));
        assert_eq!("last30".parse(), Ok(EarningsRange::Last30Days));
        assert_eq!("2025".parse(), Ok(EarningsRange::Year(2025)));
        assert!("yesterday".parse::<EarningsRange>().is_err());
        assert!("".parse::<EarningsRange>().is_err());
    }
}
