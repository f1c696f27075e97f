//! Inbound webhook payloads from the payment and meeting providers.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Payment provider
// ---------------------------------------------------------------------------

/// Minimal envelope used to dispatch on the event type before committing
/// to a full parse.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventKind {
    pub event_type: CompactString,
}

/// A `checkout.completed` event from the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub event_type: CompactString,
    pub payment: PaymentObject,
    #[serde(default)]
    pub metadata: CheckoutMetadata,
}

/// The payment object attached to a provider event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentObject {
    /// Provider-side payment id; the idempotency key.
    pub id: CompactString,
    /// Amount in minor units (the provider convention).
    pub amount: i64,
    pub currency: CompactString,
    /// `paid`, `pending`, `failed`, ...
    pub status: CompactString,
}

impl PaymentObject {
    /// Amount in major units (provider sends minor units).
    pub fn amount_decimal(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }
}

/// Checkout session metadata.
///
/// The provider transports metadata as a flat string map, so every field
/// arrives as an optional string; the typed accessors do the parsing.
/// The branch flags are mutually exclusive by convention, not enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub is_wallet: Option<String>,
    pub is_bulk: Option<String>,
    pub is_bonus: Option<String>,
    pub is_special: Option<String>,
    pub user_id: Option<String>,
    pub teacher_id: Option<String>,
    pub lesson_id: Option<String>,
    pub booking_id: Option<String>,
    pub amount: Option<String>,
    pub processing_fee: Option<String>,
    pub lesson_count: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("true") | Some("1"))
}

fn uuid_field(value: &Option<String>) -> Option<Uuid> {
    value.as_deref().and_then(|v| v.parse().ok())
}

fn decimal_field(value: &Option<String>) -> Option<Decimal> {
    value.as_deref().and_then(|v| v.parse().ok())
}

fn datetime_field(value: &Option<String>) -> Option<OffsetDateTime> {
    value
        .as_deref()
        .and_then(|v| OffsetDateTime::parse(v, &Rfc3339).ok())
}

impl CheckoutMetadata {
    pub fn is_wallet(&self) -> bool {
        flag(&self.is_wallet)
    }

    pub fn is_bulk(&self) -> bool {
        flag(&self.is_bulk)
    }

    pub fn is_bonus(&self) -> bool {
        flag(&self.is_bonus)
    }

    pub fn is_special(&self) -> bool {
        flag(&self.is_special)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        uuid_field(&self.user_id)
    }

    pub fn teacher_id(&self) -> Option<Uuid> {
        uuid_field(&self.teacher_id)
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        uuid_field(&self.lesson_id)
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        uuid_field(&self.booking_id)
    }

    pub fn amount(&self) -> Option<Decimal> {
        decimal_field(&self.amount)
    }

    pub fn processing_fee(&self) -> Decimal {
        decimal_field(&self.processing_fee).unwrap_or_default()
    }

    pub fn lesson_count(&self) -> i32 {
        self.lesson_count
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn starts_at(&self) -> Option<OffsetDateTime> {
        datetime_field(&self.starts_at)
    }

    pub fn ends_at(&self) -> Option<OffsetDateTime> {
        datetime_field(&self.ends_at)
    }
}

// ---------------------------------------------------------------------------
// Meeting provider
// ---------------------------------------------------------------------------

/// An event delivered by the meeting provider.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingEvent {
    pub event: CompactString,
    #[serde(default)]
    pub payload: MeetingEventPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingEventPayload {
    /// Present on `endpoint.url_validation`.
    pub plain_token: Option<String>,
    /// Present on meeting lifecycle events.
    pub object: Option<MeetingObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingObject {
    /// Meeting-room id; the provider sends it as a number or a string.
    #[serde(deserialize_with = "meeting_id")]
    pub id: CompactString,
}

fn meeting_id<'de, D>(deserializer: D) -> Result<CompactString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(CompactString),
    }
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => CompactString::from(n.to_string()),
        NumberOrString::String(s) => s,
    })
}

/// Reply to an `endpoint.url_validation` challenge.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingChallengeResponse {
    pub plain_token: String,
    pub encrypted_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_string_booleans() {
        let meta = CheckoutMetadata {
            is_wallet: Some("true".into()),
            is_bulk: Some("false".into()),
            is_bonus: Some("1".into()),
            ..Default::default()
        };
        assert!(meta.is_wallet());
        assert!(!meta.is_bulk());
        assert!(meta.is_bonus());
        assert!(!meta.is_special());
    }

    #[test]
    fn checkout_event_parses() {
        let json = r#"{
            "event_type": "checkout.completed",
            "payment": {"id": "pi_123", "amount": 450000, "currency": "jpy", "status": "paid"},
            "metadata": {
                "is_special": "true",
                "user_id": "7a6bb1a2-4f10-4dbb-9a3a-2c6a2f9c6b01",
                "amount": "4500",
                "starts_at": "2026-03-01T10:00:00Z"
            }
        }"#;
        let event: ProviderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "checkout.completed");
        assert_eq!(event.payment.amount_decimal(), Decimal::new(450000, 2));
        assert!(event.metadata.is_special());
        assert!(event.metadata.user_id().is_some());
        assert!(event.metadata.starts_at().is_some());
        assert_eq!(event.metadata.processing_fee(), Decimal::ZERO);
    }

    #[test]
    fn event_kind_peek_ignores_unknown_shapes() {
        let json = r#"{"event_type": "charge.succeeded", "charge": {"amount": 12}}"#;
        let kind: ProviderEventKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind.event_type, "charge.succeeded");
    }

    #[test]
    fn meeting_id_accepts_number_or_string() {
        let a: MeetingEvent = serde_json::from_str(
            r#"{"event": "meeting.participant_left", "payload": {"object": {"id": 8123456}}}"#,
        )
        .unwrap();
        let b: MeetingEvent = serde_json::from_str(
            r#"{"event": "meeting.participant_left", "payload": {"object": {"id": "8123456"}}}"#,
        )
        .unwrap();
        assert_eq!(a.payload.object.unwrap().id, "8123456");
        assert_eq!(b.payload.object.unwrap().id, "8123456");
    }
}
