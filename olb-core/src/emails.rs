//! Email subjects and HTML bodies.
//!
//! Times are rendered in the recipient's stored time zone when it parses as
//! a fixed offset, otherwise in UTC. Offsets only; there is no tz-database
//! lookup, so named zones fall back to UTC.

use crate::entities::bookings::BookingNotification;
use crate::entities::bulk_lessons::BulkLessonNotification;
use crate::entities::special_slots::SharedSlot;
use crate::mailer::EmailMessage;
use time::macros::format_description;
use time::{PrimitiveDateTime, UtcOffset};

fn parse_offset(tz: &str) -> Option<UtcOffset> {
    if matches!(tz, "Z" | "UTC" | "utc") {
        return Some(UtcOffset::UTC);
    }
    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1i8, &tz[1..]),
        b'-' => (-1i8, &tz[1..]),
        _ => return None,
    };
    let mut parts = rest.splitn(2, ':');
    let hours: i8 = parts.next()?.parse().ok()?;
    let minutes: i8 = parts.next().unwrap_or("0").parse().ok()?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

/// Render a stored UTC timestamp for a recipient.
fn format_local(t: PrimitiveDateTime, tz: Option<&str>) -> String {
    let offset = tz.and_then(parse_offset).unwrap_or(UtcOffset::UTC);
    let local = t.assume_utc().to_offset(offset);
    let stamp = local
        .format(format_description!(
            "[month repr:short] [day padding:none], [year] [hour]:[minute]"
        ))
        .unwrap_or_else(|_| local.to_string());
    format!(
        "{stamp} (UTC{:+03}:{:02})",
        offset.whole_hours(),
        offset.minutes_past_hour().abs()
    )
}

// ---------------------------------------------------------------------------
// Booking confirmation
// ---------------------------------------------------------------------------

pub fn booking_confirmed_student(n: &BookingNotification) -> EmailMessage {
    let when = format_local(n.starts_at, n.student_time_zone.as_deref());
    let meeting = match &n.meeting_id {
        Some(id) => format!("<p>Meeting room: {id}</p>"),
        None => String::new(),
    };
    EmailMessage {
        to: n.student_email.clone(),
        subject: format!("Your lesson \"{}\" is confirmed", n.lesson_title),
        html: format!(
            "<p>Hi {},</p>\
             <p>Your booking of <b>{}</b> with {} is confirmed.</p>\
             <p>Starts: {when}</p>\
             {meeting}\
             <p>See you there!</p>",
            n.student_name, n.lesson_title, n.teacher_name
        ),
    }
}

pub fn booking_confirmed_teacher(n: &BookingNotification) -> EmailMessage {
    let when = format_local(n.starts_at, n.teacher_time_zone.as_deref());
    EmailMessage {
        to: n.teacher_email.clone(),
        subject: format!("New booking: {}", n.lesson_title),
        html: format!(
            "<p>Hi {},</p>\
             <p>{} booked <b>{}</b>.</p>\
             <p>Starts: {when}</p>\
             <p>Amount paid: {}</p>",
            n.teacher_name, n.student_name, n.lesson_title, n.total_amount
        ),
    }
}

// ---------------------------------------------------------------------------
// Bulk purchase
// ---------------------------------------------------------------------------

pub fn bulk_purchased_student(n: &BulkLessonNotification) -> EmailMessage {
    EmailMessage {
        to: n.student_email.clone(),
        subject: format!("Lesson pack purchased: {}", n.lesson_title),
        html: format!(
            "<p>Hi {},</p>\
             <p>You purchased a pack of {} lessons of <b>{}</b> with {}.</p>\
             <p>Total: {}</p>\
             <p>Schedule them any time from your dashboard.</p>",
            n.student_name, n.lessons_total, n.lesson_title, n.teacher_name, n.total_amount
        ),
    }
}

pub fn bulk_purchased_teacher(n: &BulkLessonNotification) -> EmailMessage {
    EmailMessage {
        to: n.teacher_email.clone(),
        subject: format!("Lesson pack sold: {}", n.lesson_title),
        html: format!(
            "<p>Hi {},</p>\
             <p>{} purchased a pack of {} lessons of <b>{}</b>.</p>",
            n.teacher_name, n.student_name, n.lessons_total, n.lesson_title
        ),
    }
}

// ---------------------------------------------------------------------------
// Special slot invite
// ---------------------------------------------------------------------------

pub fn special_slot_invite(slot: &SharedSlot, share_link: &str) -> EmailMessage {
    let when = format_local(slot.starts_at, slot.student_time_zone.as_deref());
    EmailMessage {
        to: slot.student_email.clone(),
        subject: format!("{} offered you a lesson slot", slot.teacher_name),
        html: format!(
            "<p>Hi {},</p>\
             <p>{} reserved a special slot of <b>{}</b> for you.</p>\
             <p>Starts: {when}</p>\
             <p>Price: {}</p>\
             <p><a href=\"{share_link}\">Review and book the slot</a>\
             (the link expires in 48 hours).</p>",
            slot.student_name, slot.teacher_name, slot.lesson_title, slot.amount
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SlotPaymentStatus;
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use uuid::Uuid;

    #[test]
    fn offset_parsing() {
        assert_eq!(parse_offset("UTC"), Some(UtcOffset::UTC));
        assert_eq!(parse_offset("Z"), Some(UtcOffset::UTC));
        assert_eq!(parse_offset("+09:00"), UtcOffset::from_hms(9, 0, 0).ok());
        assert_eq!(parse_offset("-05:30"), UtcOffset::from_hms(-5, -30, 0).ok());
        assert_eq!(parse_offset("+09"), UtcOffset::from_hms(9, 0, 0).ok());
        assert_eq!(parse_offset("Asia/Tokyo"), None);
    }

    #[test]
    fn format_local_applies_offset() {
        let rendered = format_local(datetime!(2026-03-01 10:00), Some("+09:00"));
        assert_eq!(rendered, "Mar 1, 2026 19:00 (UTC+09:00)");
    }

    #[test]
    fn format_local_falls_back_to_utc() {
        let rendered = format_local(datetime!(2026-03-01 10:00), Some("Asia/Tokyo"));
        assert_eq!(rendered, "Mar 1, 2026 10:00 (UTC+00:00)");
    }

    #[test]
    fn invite_carries_the_share_link() {
        let slot = SharedSlot {
            id: Uuid::from_u128(1),
            teacher_name: "Noa".into(),
            student_name: "Kim".into(),
            student_email: "kim@example.com".into(),
            student_time_zone: None,
            lesson_title: "Conversational French".into(),
            amount: Decimal::new(4500, 2),
            starts_at: datetime!(2026-03-01 10:00),
            ends_at: datetime!(2026-03-01 11:00),
            payment_status: SlotPaymentStatus::Pending,
        };
        let message = special_slot_invite(&slot, "https://app.example.com/slot/abc");
        assert_eq!(message.to, "kim@example.com");
        assert!(message.html.contains("https://app.example.com/slot/abc"));
        assert!(message.subject.contains("Noa"));
    }
}
