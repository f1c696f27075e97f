//! HTTP API modules.
//!
//! - `teacher` — authenticated teacher endpoints under `/api/teacher`
//! - `public` — unauthenticated share-link endpoints under `/api/slots`
//! - `webhooks` — payment/meeting provider callbacks under `/api/webhooks`

pub mod extractors;
pub mod public;
pub mod teacher;
pub mod webhooks;
