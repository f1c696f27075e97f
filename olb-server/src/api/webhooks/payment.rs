//! Payment-provider webhook.
//!
//! Verifies the `Payment-Signature` header over the raw body, then runs the
//! checkout state machine. Follow-up emails are queued after the database
//! writes commit, and meeting-room provisioning is spawned best-effort so
//! the provider gets its acknowledgment quickly.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use kanau::processor::Processor;
use olb_core::entities::bookings::{Booking, SetBookingMeeting};
use olb_core::entities::lessons::GetLessonById;
use olb_core::framework::DatabaseProcessor;
use olb_core::payments::{self, CheckoutError, CheckoutOutcome};
use olb_sdk::objects::{ProviderEvent, ProviderEventKind};
use olb_sdk::signature::{self, PAYMENT_SIGNATURE_HEADER, SignatureError};

use crate::state::AppState;

/// `POST /api/webhooks/payment`.
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, PaymentWebhookError> {
    let header_value = headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .ok_or(PaymentWebhookError::MissingSignature)?
        .to_str()
        .map_err(|_| PaymentWebhookError::InvalidSignature)?;

    let (timestamp, sig) = signature::parse_signature_header(header_value)?;
    let payments_config = state.config.payments.read().await;
    signature::verify_body(&body, timestamp, &sig, payments_config.webhook_secret())?;
    drop(payments_config);

    // Peek at the envelope first; most event types are acknowledged unread.
    let kind: ProviderEventKind =
        serde_json::from_str(&body).map_err(PaymentWebhookError::InvalidJson)?;
    if kind.event_type != "checkout.completed" {
        tracing::info!(event_type = %kind.event_type, "acknowledging unhandled provider event");
        return Ok(StatusCode::OK);
    }

    let event: ProviderEvent =
        serde_json::from_str(&body).map_err(PaymentWebhookError::InvalidJson)?;

    match payments::process_checkout(&state.db, &event).await? {
        CheckoutOutcome::Processed { followups, booking } => {
            for followup in followups {
                if let Err(e) = state.events.email.send(followup).await {
                    tracing::error!(error = %e, "Failed to queue follow-up email");
                }
            }
            if let Some(booking) = booking {
                let state = state.clone();
                tokio::spawn(async move {
                    provision_meeting(state, booking).await;
                });
            }
        }
        CheckoutOutcome::AlreadyProcessed | CheckoutOutcome::Skipped => {}
    }

    Ok(StatusCode::OK)
}

/// Create a meeting room for a confirmed booking and attach it.
///
/// Best-effort: failure leaves the booking without a room and is only
/// logged. The notification dispatcher reads the meeting id at send time,
/// so a room attached quickly still makes it into the email.
async fn provision_meeting(state: AppState, booking: Booking) {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let topic = match processor.process(GetLessonById(booking.lesson_id)).await {
        Ok(Some(lesson)) => lesson.title,
        Ok(None) => "Lesson".to_string(),
        Err(e) => {
            tracing::error!(error = %e, booking_id = %booking.id, "Failed to load lesson for meeting topic");
            "Lesson".to_string()
        }
    };

    let duration_minutes = (booking.ends_at - booking.starts_at).whole_minutes().max(1);
    let created = match state
        .meeting_client
        .create_meeting(&topic, booking.starts_at.assume_utc(), duration_minutes)
        .await
    {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(error = %e, booking_id = %booking.id, "Failed to create meeting room");
            return;
        }
    };

    match processor
        .process(SetBookingMeeting {
            booking_id: booking.id,
            meeting_id: created.id.clone(),
        })
        .await
    {
        Ok(_) => {
            tracing::info!(booking_id = %booking.id, meeting_id = %created.id, "Meeting room attached")
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = %booking.id, "Failed to attach meeting room")
        }
    }
}

/// Errors that can occur in the payment webhook.
#[derive(Debug)]
pub enum PaymentWebhookError {
    MissingSignature,
    InvalidSignature,
    StaleSignature,
    InvalidJson(serde_json::Error),
    BadMetadata(&'static str),
    Database(sqlx::Error),
}

impl From<SignatureError> for PaymentWebhookError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Expired => Self::StaleSignature,
            _ => Self::InvalidSignature,
        }
    }
}

impl From<CheckoutError> for PaymentWebhookError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Database(e) => Self::Database(e),
            CheckoutError::Metadata(field) => Self::BadMetadata(field),
        }
    }
}

impl IntoResponse for PaymentWebhookError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PaymentWebhookError::MissingSignature => {
                (StatusCode::BAD_REQUEST, "missing Payment-Signature header").into_response()
            }
            PaymentWebhookError::InvalidSignature => {
                (StatusCode::BAD_REQUEST, "signature verification failed").into_response()
            }
            PaymentWebhookError::StaleSignature => {
                (StatusCode::BAD_REQUEST, "signature expired").into_response()
            }
            PaymentWebhookError::InvalidJson(e) => {
                tracing::warn!(error = %e, "Malformed provider event");
                (StatusCode::BAD_REQUEST, "invalid JSON body").into_response()
            }
            PaymentWebhookError::BadMetadata(field) => {
                tracing::warn!(field, "Provider event with unusable metadata");
                (StatusCode::BAD_REQUEST, "invalid checkout metadata").into_response()
            }
            PaymentWebhookError::Database(e) => {
                tracing::error!(error = %e, "Payment webhook database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
