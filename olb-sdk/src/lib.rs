//! SDK for Open Lesson Booking.
//!
//! Contains the wire objects exchanged with the server and the HMAC
//! signature scheme used by webhooks, access tokens, and share links.

pub mod objects;
pub mod signature;
