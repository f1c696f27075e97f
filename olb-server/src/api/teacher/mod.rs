//! Teacher API handlers.
//!
//! All endpoints require a teacher access token
//! (`Authorization: Bearer {token}`).
//!
//! # Endpoints
//!
//! - `POST   /availability`      – add an availability block
//! - `GET    /availability`      – derived schedule (free + booked slots)
//! - `PUT    /availability/{id}` – move a block's endpoints
//! - `DELETE /availability/{id}` – remove a block
//! - `GET    /bookings`          – list bookings by period
//! - `GET    /earnings`          – completed bookings + payout buckets
//! - `GET    /catalog`           – lessons and bookable students
//! - `POST   /special-slots`     – offer an out-of-availability slot
//! - `GET    /special-slots`     – list offered slots

pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod earnings;
pub mod special_slots;

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build the Teacher API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/availability",
            post(availability::add).get(availability::schedule),
        )
        .route(
            "/availability/{id}",
            put(availability::update).delete(availability::remove),
        )
        .route("/bookings", get(bookings::list))
        .route("/earnings", get(earnings::report))
        .route("/catalog", get(catalog::show))
        .route(
            "/special-slots",
            post(special_slots::create).get(special_slots::list),
        )
}
