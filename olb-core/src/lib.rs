#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod emails;
pub mod entities;
pub mod events;
pub mod framework;
pub mod mailer;
pub mod meetings;
pub mod payments;
pub mod processors;
pub mod scheduling;
