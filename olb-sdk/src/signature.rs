//! Signature algorithm and verification for all Open Lesson Booking wire
//! surfaces.
//!
//! Everything here is HMAC-SHA256. The wire format for signature headers is:
//!
//! ```text
//! Payment-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! Three schemes exist:
//!
//! * **Body signing** (payment-provider webhook):
//!   `HMAC-SHA256("{timestamp}.{raw_body}", secret)`
//!
//! * **Record tokens** (access tokens and public share links):
//!   `{expiry}.{base32_record_id}.{base64url_signature}` where the signature
//!   covers `"{record_id}.{expiry}"`
//!
//! * **Challenge digests** (meeting-provider endpoint validation):
//!   hex-encoded `HMAC-SHA256(plain_token, secret)`

use uuid::Uuid;

/// Header name for the payment-provider HMAC signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "Payment-Signature";

/// Maximum allowed age of a webhook signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Lifetime of a special-slot share link (in seconds).
pub const SHARE_TOKEN_TTL: i64 = 48 * 60 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// Body signing — payment webhooks
// ---------------------------------------------------------------------------

/// Sign a raw request body: `HMAC-SHA256("{timestamp}.{body}", key)`.
///
/// Returns the formatted `Payment-Signature` header value.
pub fn sign_body(body: &str, key: &[u8]) -> String {
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
    let data = format!("{timestamp}.{body}");
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    format_signature_header(timestamp, sig.as_ref())
}

/// Verify a signed raw body against a parsed signature header.
///
/// Checks `HMAC-SHA256("{timestamp}.{body}", key)` and timestamp freshness.
pub fn verify_body(
    body: &str,
    timestamp: i64,
    signature: &[u8],
    key: &[u8],
) -> Result<(), SignatureError> {
    let data = format!("{timestamp}.{body}");
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        signature,
    )?;
    check_timestamp(timestamp)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `{timestamp}.{base64}` header value into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let dot_pos = value.find('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = value[..dot_pos]
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(&value[dot_pos + 1..])
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Record tokens — access tokens and share links
// ---------------------------------------------------------------------------

/// Issue a signed, time-limited token embedding a record id.
///
/// Token layout: `{expiry}.{base32(id)}.{base64url(signature)}` where the
/// signature covers `"{id}.{expiry}"`. The same scheme backs teacher access
/// tokens (session secret) and special-slot share links (link secret); only
/// the key differs.
pub fn issue_token(record_id: Uuid, ttl_seconds: i64, key: &[u8]) -> String {
    let expiry = time::OffsetDateTime::now_utc().unix_timestamp() + ttl_seconds;
    let data = format!("{}.{}", record_id.simple(), expiry);
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    format!(
        "{}.{}.{}",
        expiry,
        fast32::base32::CROCKFORD.encode(record_id.as_bytes()),
        fast32::base64::RFC4648_URL_NOPAD.encode(sig.as_ref()),
    )
}

/// Redeem a token issued by [`issue_token`], returning the embedded record id.
///
/// Fails on malformed input, a bad signature, or an expired token.
pub fn redeem_token(token: &str, key: &[u8]) -> Result<Uuid, SignatureError> {
    let mut parts = token.splitn(3, '.');
    let expiry: i64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or(SignatureError::InvalidFormat)?;
    let id_part = parts.next().ok_or(SignatureError::InvalidFormat)?;
    let sig_part = parts.next().ok_or(SignatureError::InvalidFormat)?;

    let id_bytes = fast32::base32::CROCKFORD
        .decode_str(id_part)
        .map_err(|_| SignatureError::InvalidFormat)?;
    let record_id =
        Uuid::from_slice(&id_bytes).map_err(|_| SignatureError::InvalidFormat)?;
    let signature = fast32::base64::RFC4648_URL_NOPAD
        .decode_str(sig_part)
        .map_err(|_| SignatureError::InvalidBase64)?;

    let data = format!("{}.{}", record_id.simple(), expiry);
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        &signature,
    )?;

    if time::OffsetDateTime::now_utc().unix_timestamp() > expiry {
        return Err(SignatureError::Expired);
    }
    Ok(record_id)
}

// ---------------------------------------------------------------------------
// Challenge digests — meeting-provider endpoint validation
// ---------------------------------------------------------------------------

/// Answer a meeting-provider URL-validation challenge.
///
/// Returns hex-encoded `HMAC-SHA256(plain_token, key)`.
pub fn challenge_digest(plain_token: &str, key: &[u8]) -> String {
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        plain_token.as_bytes(),
    );
    hex::encode(sig.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret-key";

    #[test]
    fn body_signature_roundtrip() {
        let body = r#"{"event_type":"checkout.completed"}"#;
        let header = sign_body(body, KEY);
        let (ts, sig) = parse_signature_header(&header).unwrap();
        verify_body(body, ts, &sig, KEY).unwrap();
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign_body("original", KEY);
        let (ts, sig) = parse_signature_header(&header).unwrap();
        assert!(matches!(
            verify_body("tampered", ts, &sig, KEY),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let header = sign_body("body", KEY);
        let (ts, sig) = parse_signature_header(&header).unwrap();
        assert!(verify_body("body", ts, &sig, b"other-key").is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let old = time::OffsetDateTime::now_utc().unix_timestamp() - MAX_SIGNATURE_AGE - 1;
        assert!(matches!(
            check_timestamp(old),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn header_without_dot_is_invalid() {
        assert!(matches!(
            parse_signature_header("notavalidheader"),
            Err(SignatureError::InvalidFormat)
        ));
    }

    #[test]
    fn token_roundtrip() {
        let id = Uuid::new_v4();
        let token = issue_token(id, 3600, KEY);
        assert_eq!(redeem_token(&token, KEY).unwrap(), id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(Uuid::new_v4(), -1, KEY);
        assert!(matches!(
            redeem_token(&token, KEY),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn token_with_wrong_key_is_rejected() {
        let token = issue_token(Uuid::new_v4(), 3600, KEY);
        assert!(matches!(
            redeem_token(&token, b"other-key"),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(redeem_token("not.a.token", KEY).is_err());
        assert!(redeem_token("", KEY).is_err());
    }

    #[test]
    fn challenge_digest_is_deterministic_hex() {
        let a = challenge_digest("plain", KEY);
        let b = challenge_digest("plain", KEY);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
