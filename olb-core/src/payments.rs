//! Checkout-completion processing.
//!
//! A verified `checkout.completed` delivery fans out into one of four
//! branches selected by metadata flags: wallet top-up, bulk-lesson pack,
//! bonus tip, or booking confirmation. All branch writes share one
//! transaction with the payment-record insert, whose unique
//! `provider_payment_id` makes redeliveries no-ops.

use crate::entities::PaymentKind;
use crate::entities::bonuses::{Bonus, NewBonus};
use crate::entities::bookings::{Booking, NewBooking};
use crate::entities::bulk_lessons::{BulkLesson, NewBulkLesson};
use crate::entities::payment_records::{NewPaymentRecord, PaymentRecord};
use crate::entities::special_slots::SpecialSlot;
use crate::entities::wallets::Wallet;
use crate::events::types::EmailEvent;
use crate::scheduling::to_utc;
use olb_sdk::objects::{CheckoutMetadata, ProviderEvent};
use rust_decimal::Decimal;
use sqlx::PgPool;
use time::PrimitiveDateTime;

/// Portion of the post-fee amount that goes to the teacher.
fn teacher_share() -> Decimal {
    Decimal::new(9, 1)
}

/// Split a gross amount into the teacher's earning and the platform's cut.
///
/// The processing fee comes off the top; the teacher keeps 90% of the
/// remainder.
pub fn earning_split(amount: Decimal, processing_fee: Decimal) -> (Decimal, Decimal) {
    let net = amount - processing_fee;
    let teacher_earning = net * teacher_share();
    let admin_commission = net - teacher_earning;
    (teacher_earning, admin_commission)
}

/// Which writes a checkout triggers. Flags are checked in a fixed order and
/// the first match wins; a delivery with no flags set confirms a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutBranch {
    Wallet,
    Bulk,
    Bonus,
    Booking,
}

impl CheckoutBranch {
    pub fn from_metadata(metadata: &CheckoutMetadata) -> Self {
        if metadata.is_wallet() {
            CheckoutBranch::Wallet
        } else if metadata.is_bulk() {
            CheckoutBranch::Bulk
        } else if metadata.is_bonus() {
            CheckoutBranch::Bonus
        } else {
            CheckoutBranch::Booking
        }
    }
}

/// Whether a provider event mutates state at all. Everything except a paid
/// `checkout.completed` is acknowledged without processing.
pub fn mutates_state(event: &ProviderEvent) -> bool {
    event.event_type == "checkout.completed" && event.payment.status == "paid"
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A branch-required metadata field is absent or unparseable. The
    /// delivery is malformed, not retryable.
    #[error("missing or invalid checkout metadata field: {0}")]
    Metadata(&'static str),
}

/// Result of processing one delivery.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Branch writes committed. `followups` are emitted after the caller
    /// returns to the channel layer; `booking` is present when a booking
    /// was created and a meeting room should be provisioned.
    Processed {
        followups: Vec<EmailEvent>,
        booking: Option<Booking>,
    },
    /// An earlier delivery of the same provider payment already won.
    AlreadyProcessed,
    /// The event type or payment status does not trigger processing.
    Skipped,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, CheckoutError> {
    value.ok_or(CheckoutError::Metadata(field))
}

fn required_utc(
    value: Option<time::OffsetDateTime>,
    field: &'static str,
) -> Result<PrimitiveDateTime, CheckoutError> {
    Ok(to_utc(required(value, field)?))
}

/// Process one verified payment-provider delivery.
///
/// Returns without writes for non-mutating events. Otherwise opens a
/// transaction, claims the provider payment id, performs the branch writes
/// and commits; dropping the transaction on any error path rolls everything
/// back together.
#[tracing::instrument(skip_all, err, fields(payment_id = %event.payment.id))]
pub async fn process_checkout(
    pool: &PgPool,
    event: &ProviderEvent,
) -> Result<CheckoutOutcome, CheckoutError> {
    if !mutates_state(event) {
        tracing::debug!(event_type = %event.event_type, "ignoring non-mutating provider event");
        return Ok(CheckoutOutcome::Skipped);
    }

    let metadata = &event.metadata;
    let branch = CheckoutBranch::from_metadata(metadata);
    let user_id = required(metadata.user_id(), "user_id")?;
    let amount = metadata
        .amount()
        .unwrap_or_else(|| event.payment.amount_decimal());

    let mut tx = pool.begin().await?;

    let kind = match branch {
        CheckoutBranch::Wallet => PaymentKind::WalletTopup,
        CheckoutBranch::Bulk => PaymentKind::Bulk,
        CheckoutBranch::Bonus => PaymentKind::Bonus,
        CheckoutBranch::Booking => PaymentKind::Lesson,
    };
    let Some(payment_id) = PaymentRecord::insert_if_absent_tx(
        &mut tx,
        NewPaymentRecord {
            provider_payment_id: &event.payment.id,
            kind,
            status: &event.payment.status,
            amount,
            currency: &event.payment.currency,
            user_id,
            lesson_id: metadata.lesson_id(),
        },
    )
    .await?
    else {
        tracing::info!("provider payment already processed");
        return Ok(CheckoutOutcome::AlreadyProcessed);
    };

    let outcome = match branch {
        CheckoutBranch::Wallet => {
            let balance = Wallet::credit_tx(&mut tx, user_id, amount, payment_id).await?;
            tracing::info!(%user_id, %balance, "wallet credited");
            CheckoutOutcome::Processed {
                followups: Vec::new(),
                booking: None,
            }
        }
        CheckoutBranch::Bulk => {
            let teacher_id = required(metadata.teacher_id(), "teacher_id")?;
            let lesson_id = required(metadata.lesson_id(), "lesson_id")?;
            let lessons_total = metadata.lesson_count();
            if lessons_total <= 0 {
                return Err(CheckoutError::Metadata("lesson_count"));
            }
            let processing_fee = metadata.processing_fee();
            let (teacher_earning, admin_commission) = earning_split(amount, processing_fee);
            let pack = BulkLesson::insert_tx(
                &mut tx,
                NewBulkLesson {
                    teacher_id,
                    student_id: user_id,
                    lesson_id,
                    payment_id,
                    total_amount: amount,
                    teacher_earning,
                    admin_commission,
                    processing_fee,
                    lessons_total,
                },
            )
            .await?;
            CheckoutOutcome::Processed {
                followups: vec![EmailEvent::BulkLessonPurchased { pack_id: pack.id }],
                booking: None,
            }
        }
        CheckoutBranch::Bonus => {
            let teacher_id = required(metadata.teacher_id(), "teacher_id")?;
            let lesson_id = required(metadata.lesson_id(), "lesson_id")?;
            let booking_id = required(metadata.booking_id(), "booking_id")?;
            let bonus = Bonus::insert_tx(
                &mut tx,
                NewBonus {
                    student_id: user_id,
                    teacher_id,
                    lesson_id,
                    booking_id,
                    payment_id,
                    amount,
                    currency: &event.payment.currency,
                },
            )
            .await?;
            Booking::set_bonus_tx(&mut tx, booking_id, bonus.id).await?;
            CheckoutOutcome::Processed {
                followups: Vec::new(),
                booking: None,
            }
        }
        CheckoutBranch::Booking => {
            let teacher_id = required(metadata.teacher_id(), "teacher_id")?;
            let lesson_id = required(metadata.lesson_id(), "lesson_id")?;
            let starts_at = required_utc(metadata.starts_at(), "starts_at")?;
            let ends_at = required_utc(metadata.ends_at(), "ends_at")?;
            let processing_fee = metadata.processing_fee();
            let (teacher_earning, admin_commission) = earning_split(amount, processing_fee);

            let special_slot_id = if metadata.is_special() {
                let slot_id =
                    SpecialSlot::mark_paid_tx(&mut tx, teacher_id, user_id, lesson_id, starts_at)
                        .await?;
                if slot_id.is_none() {
                    tracing::warn!(%teacher_id, %user_id, "no pending special slot matches the paid checkout");
                }
                slot_id
            } else {
                None
            };

            let booking = Booking::insert_tx(
                &mut tx,
                NewBooking {
                    teacher_id,
                    student_id: user_id,
                    lesson_id,
                    payment_id,
                    special_slot_id,
                    starts_at,
                    ends_at,
                    total_amount: amount,
                    teacher_earning,
                    admin_commission,
                    processing_fee,
                },
            )
            .await?;
            CheckoutOutcome::Processed {
                followups: vec![EmailEvent::BookingConfirmed {
                    booking_id: booking.id,
                }],
                booking: Some(booking),
            }
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;
    use olb_sdk::objects::PaymentObject;

    fn event(event_type: &str, status: &str) -> ProviderEvent {
        ProviderEvent {
            event_type: CompactString::from(event_type),
            payment: PaymentObject {
                id: CompactString::from("pi_1"),
                amount: 450000,
                currency: CompactString::from("usd"),
                status: CompactString::from(status),
            },
            metadata: CheckoutMetadata::default(),
        }
    }

    #[test]
    fn only_paid_checkout_completed_mutates() {
        assert!(mutates_state(&event("checkout.completed", "paid")));
        assert!(!mutates_state(&event("checkout.completed", "pending")));
        assert!(!mutates_state(&event("charge.succeeded", "paid")));
        assert!(!mutates_state(&event("payment_intent.created", "paid")));
    }

    #[test]
    fn branch_order_is_wallet_bulk_bonus_booking() {
        let all = CheckoutMetadata {
            is_wallet: Some("true".into()),
            is_bulk: Some("true".into()),
            is_bonus: Some("true".into()),
            is_special: Some("true".into()),
            ..Default::default()
        };
        assert_eq!(CheckoutBranch::from_metadata(&all), CheckoutBranch::Wallet);

        let bulk_and_bonus = CheckoutMetadata {
            is_bulk: Some("true".into()),
            is_bonus: Some("true".into()),
            ..Default::default()
        };
        assert_eq!(
            CheckoutBranch::from_metadata(&bulk_and_bonus),
            CheckoutBranch::Bulk
        );

        let none = CheckoutMetadata::default();
        assert_eq!(CheckoutBranch::from_metadata(&none), CheckoutBranch::Booking);

        // is_special alone still confirms a booking; it only changes how
        // the booking links to a special slot.
        let special = CheckoutMetadata {
            is_special: Some("true".into()),
            ..Default::default()
        };
        assert_eq!(
            CheckoutBranch::from_metadata(&special),
            CheckoutBranch::Booking
        );
    }

    #[test]
    fn earning_split_takes_fee_off_the_top() {
        let (teacher, admin) = earning_split(Decimal::new(10000, 2), Decimal::new(500, 2));
        // (100.00 - 5.00) * 0.9 = 85.50; platform keeps 9.50
        assert_eq!(teacher, Decimal::new(85500, 3));
        assert_eq!(admin, Decimal::new(9500, 3));
        assert_eq!(teacher + admin + Decimal::new(500, 2), Decimal::new(10000, 2));
    }

    #[test]
    fn earning_split_with_zero_fee() {
        let (teacher, admin) = earning_split(Decimal::new(4500, 0), Decimal::ZERO);
        assert_eq!(teacher, Decimal::new(40500, 1));
        assert_eq!(admin, Decimal::new(4500, 1));
    }
}
