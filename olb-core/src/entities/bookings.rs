use crate::framework::DatabaseProcessor;
use crate::scheduling::{BookingWindow, Window};
use compact_str::CompactString;
use kanau::processor::Processor;
use olb_sdk::objects::BookingPeriod;
use rust_decimal::Decimal;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub payment_id: Uuid,
    pub special_slot_id: Option<Uuid>,
    pub bonus_id: Option<Uuid>,
    pub meeting_id: Option<String>,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub admin_commission: Decimal,
    pub processing_fee: Decimal,
    pub cancelled: bool,
    pub student_confirmed: bool,
    pub teacher_confirmed: bool,
    pub payout_requested_at: Option<PrimitiveDateTime>,
    pub payout_done_at: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
}

/// Fields of a booking created by the payment webhook. The time window and
/// money split are fixed at creation.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub payment_id: Uuid,
    pub special_slot_id: Option<Uuid>,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub admin_commission: Decimal,
    pub processing_fee: Decimal,
}

impl Booking {
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewBooking,
    ) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, teacher_id, student_id, lesson_id, payment_id, special_slot_id,
                starts_at, ends_at, total_amount, teacher_earning, admin_commission,
                processing_fee
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING
                id, teacher_id, student_id, lesson_id, payment_id, special_slot_id,
                bonus_id, meeting_id, starts_at, ends_at, total_amount,
                teacher_earning, admin_commission, processing_fee, cancelled,
                student_confirmed, teacher_confirmed, payout_requested_at,
                payout_done_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.teacher_id)
        .bind(new.student_id)
        .bind(new.lesson_id)
        .bind(new.payment_id)
        .bind(new.special_slot_id)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.total_amount)
        .bind(new.teacher_earning)
        .bind(new.admin_commission)
        .bind(new.processing_fee)
        .fetch_one(&mut **tx)
        .await
    }

    /// Link a bonus payment to the booking it rewards.
    pub async fn set_bonus_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        booking_id: Uuid,
        bonus_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET bonus_id = $2 WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(bonus_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Schedule derivation input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ScheduleBooking {
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

impl ScheduleBooking {
    pub fn window(&self) -> BookingWindow {
        BookingWindow {
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            window: Window::new(self.starts_at, self.ends_at),
        }
    }
}

/// Non-cancelled bookings of a teacher, as deriver input.
#[derive(Debug, Clone, Copy)]
pub struct ListBookingsForSchedule(pub Uuid);

impl Processor<ListBookingsForSchedule> for DatabaseProcessor {
    type Output = Vec<ScheduleBooking>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListBookingsForSchedule")]
    async fn process(
        &self,
        query: ListBookingsForSchedule,
    ) -> Result<Vec<ScheduleBooking>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleBooking>(
            r#"
            SELECT student_id, lesson_id, starts_at, ends_at
            FROM bookings
            WHERE teacher_id = $1 AND NOT cancelled
            ORDER BY starts_at
            "#,
        )
        .bind(query.0)
        .fetch_all(&self.pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A booking joined with display data for listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BookingListing {
    pub id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub student_name: String,
    pub lesson_title: String,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub cancelled: bool,
    pub meeting_id: Option<String>,
}

/// Teacher's bookings for one period. Upcoming sorts soonest-first, past
/// sorts most-recent-first. Text search happens in the handler.
#[derive(Debug, Clone, Copy)]
pub struct ListTeacherBookings {
    pub teacher_id: Uuid,
    pub period: BookingPeriod,
}

/// The period splits on the start time: a lesson already in progress
/// belongs to the past listing.
fn period_sql(period: BookingPeriod) -> &'static str {
    match period {
        BookingPeriod::Upcoming => {
            r#"
            SELECT b.id, b.student_id, b.lesson_id, u.name AS student_name,
                   l.title AS lesson_title, b.starts_at, b.ends_at,
                   b.total_amount, b.teacher_earning, b.cancelled, b.meeting_id
            FROM bookings b
            JOIN users u ON u.id = b.student_id
            JOIN lessons l ON l.id = b.lesson_id
            WHERE b.teacher_id = $1 AND NOT b.cancelled
              AND b.starts_at > (now() AT TIME ZONE 'utc')
            ORDER BY b.starts_at ASC
            "#
        }
        BookingPeriod::Past => {
            r#"
            SELECT b.id, b.student_id, b.lesson_id, u.name AS student_name,
                   l.title AS lesson_title, b.starts_at, b.ends_at,
                   b.total_amount, b.teacher_earning, b.cancelled, b.meeting_id
            FROM bookings b
            JOIN users u ON u.id = b.student_id
            JOIN lessons l ON l.id = b.lesson_id
            WHERE b.teacher_id = $1 AND NOT b.cancelled
              AND b.starts_at <= (now() AT TIME ZONE 'utc')
            ORDER BY b.starts_at DESC
            "#
        }
    }
}

impl Processor<ListTeacherBookings> for DatabaseProcessor {
    type Output = Vec<BookingListing>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListTeacherBookings")]
    async fn process(&self, query: ListTeacherBookings) -> Result<Vec<BookingListing>, sqlx::Error> {
        sqlx::query_as::<_, BookingListing>(period_sql(query.period))
            .bind(query.teacher_id)
            .fetch_all(&self.pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

/// Aggregate earning buckets over completed bookings (both parties
/// confirmed, not cancelled).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EarningsTotals {
    pub total_earnings: Decimal,
    pub pending_earnings: Decimal,
    pub requested_earnings: Decimal,
    pub approved_earnings: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct GetEarningsTotals {
    pub teacher_id: Uuid,
    pub since: Option<PrimitiveDateTime>,
    pub until: Option<PrimitiveDateTime>,
}

impl Processor<GetEarningsTotals> for DatabaseProcessor {
    type Output = EarningsTotals;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetEarningsTotals")]
    async fn process(&self, query: GetEarningsTotals) -> Result<EarningsTotals, sqlx::Error> {
        sqlx::query_as::<_, EarningsTotals>(
            r#"
            SELECT
                COALESCE(SUM(teacher_earning), 0) AS total_earnings,
                COALESCE(SUM(CASE WHEN payout_requested_at IS NULL
                    THEN teacher_earning ELSE 0 END), 0) AS pending_earnings,
                COALESCE(SUM(CASE WHEN payout_requested_at IS NOT NULL
                    AND payout_done_at IS NULL
                    THEN teacher_earning ELSE 0 END), 0) AS requested_earnings,
                COALESCE(SUM(CASE WHEN payout_done_at IS NOT NULL
                    THEN teacher_earning ELSE 0 END), 0) AS approved_earnings
            FROM bookings
            WHERE teacher_id = $1 AND NOT cancelled
              AND student_confirmed AND teacher_confirmed
              AND ($2::timestamp IS NULL OR starts_at >= $2)
              AND ($3::timestamp IS NULL OR starts_at < $3)
            "#,
        )
        .bind(query.teacher_id)
        .bind(query.since)
        .bind(query.until)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EarningRecord {
    pub booking_id: Uuid,
    pub lesson_title: String,
    pub student_name: String,
    pub starts_at: PrimitiveDateTime,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub provider_payment_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ListEarningRecords {
    pub teacher_id: Uuid,
    pub since: Option<PrimitiveDateTime>,
    pub until: Option<PrimitiveDateTime>,
}

impl Processor<ListEarningRecords> for DatabaseProcessor {
    type Output = Vec<EarningRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEarningRecords")]
    async fn process(&self, query: ListEarningRecords) -> Result<Vec<EarningRecord>, sqlx::Error> {
        sqlx::query_as::<_, EarningRecord>(
            r#"
            SELECT b.id AS booking_id, l.title AS lesson_title,
                   u.name AS student_name, b.starts_at, b.total_amount,
                   b.teacher_earning, pr.provider_payment_id
            FROM bookings b
            JOIN users u ON u.id = b.student_id
            JOIN lessons l ON l.id = b.lesson_id
            JOIN payment_records pr ON pr.id = b.payment_id
            WHERE b.teacher_id = $1 AND NOT b.cancelled
              AND b.student_confirmed AND b.teacher_confirmed
              AND ($2::timestamp IS NULL OR b.starts_at >= $2)
              AND ($3::timestamp IS NULL OR b.starts_at < $3)
            ORDER BY b.starts_at DESC
            "#,
        )
        .bind(query.teacher_id)
        .bind(query.since)
        .bind(query.until)
        .fetch_all(&self.pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Meeting linkage
// ---------------------------------------------------------------------------

/// Attach a meeting room to a booking after the provider created it.
/// Runs on the pool, outside the payment transaction.
#[derive(Debug, Clone)]
pub struct SetBookingMeeting {
    pub booking_id: Uuid,
    pub meeting_id: CompactString,
}

impl Processor<SetBookingMeeting> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetBookingMeeting")]
    async fn process(&self, command: SetBookingMeeting) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET meeting_id = $2 WHERE id = $1
            "#,
        )
        .bind(command.booking_id)
        .bind(command.meeting_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BookingEnd {
    pub id: Uuid,
    pub ends_at: PrimitiveDateTime,
}

/// End time of the booking that owns a meeting room. The janitor uses this
/// to decide whether an emptied room may be closed.
#[derive(Debug, Clone)]
pub struct GetBookingEndByMeetingId(pub CompactString);

impl Processor<GetBookingEndByMeetingId> for DatabaseProcessor {
    type Output = Option<BookingEnd>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBookingEndByMeetingId")]
    async fn process(
        &self,
        query: GetBookingEndByMeetingId,
    ) -> Result<Option<BookingEnd>, sqlx::Error> {
        sqlx::query_as::<_, BookingEnd>(
            r#"
            SELECT id, ends_at
            FROM bookings
            WHERE meeting_id = $1 AND NOT cancelled
            ORDER BY ends_at DESC
            LIMIT 1
            "#,
        )
        .bind(query.0.as_str())
        .fetch_optional(&self.pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Notification addressing
// ---------------------------------------------------------------------------

/// Everything the booking-confirmation emails need, fetched at send time.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BookingNotification {
    pub booking_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub student_time_zone: Option<String>,
    pub teacher_name: String,
    pub teacher_email: String,
    pub teacher_time_zone: Option<String>,
    pub lesson_title: String,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub total_amount: Decimal,
    pub meeting_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct GetBookingNotification(pub Uuid);

impl Processor<GetBookingNotification> for DatabaseProcessor {
    type Output = Option<BookingNotification>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBookingNotification")]
    async fn process(
        &self,
        query: GetBookingNotification,
    ) -> Result<Option<BookingNotification>, sqlx::Error> {
        sqlx::query_as::<_, BookingNotification>(
            r#"
            SELECT b.id AS booking_id,
                   s.name AS student_name, s.email AS student_email,
                   s.time_zone AS student_time_zone,
                   t.name AS teacher_name, t.email AS teacher_email,
                   t.time_zone AS teacher_time_zone,
                   l.title AS lesson_title, b.starts_at, b.ends_at,
                   b.total_amount, b.meeting_id
            FROM bookings b
            JOIN users s ON s.id = b.student_id
            JOIN users t ON t.id = b.teacher_id
            JOIN lessons l ON l.id = b.lesson_id
            WHERE b.id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_split_on_start_time() {
        let upcoming = period_sql(BookingPeriod::Upcoming);
        assert!(upcoming.contains("b.starts_at > (now() AT TIME ZONE 'utc')"));
        assert!(upcoming.contains("ORDER BY b.starts_at ASC"));

        // A lesson in progress (started, not yet ended) lists as past.
        let past = period_sql(BookingPeriod::Past);
        assert!(past.contains("b.starts_at <= (now() AT TIME ZONE 'utc')"));
        assert!(past.contains("ORDER BY b.starts_at DESC"));
    }
}
