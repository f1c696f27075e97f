//! Provider webhook endpoints.
//!
//! # Endpoints
//!
//! - `POST /payment` – payment-provider events (signed body)
//! - `POST /meeting` – meeting-provider events (challenge + occupancy)

pub mod meeting;
pub mod payment;

use crate::state::AppState;
use axum::{Router, routing::post};

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment", post(payment::handle))
        .route("/meeting", post(meeting::handle))
}
