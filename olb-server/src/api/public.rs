//! Public share-link endpoints.
//!
//! # Endpoints
//!
//! - `GET /{token}` – view a special slot behind a signed share link

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use kanau::processor::Processor;
use olb_core::entities::special_slots::GetSharedSlot;
use olb_core::framework::DatabaseProcessor;
use olb_sdk::objects::SharedSlotView;
use olb_sdk::signature::{self, SignatureError};

use crate::state::AppState;

/// Build the public slots router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{token}", get(view_shared_slot))
}

/// `GET /api/slots/{token}` — redeem a share link.
///
/// No authentication; the signed token is the capability.
async fn view_shared_slot(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, SharedSlotError> {
    let links = state.config.links.read().await;
    let slot_id = signature::redeem_token(&token, links.share_secret())?;
    drop(links);

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let slot = processor
        .process(GetSharedSlot(slot_id))
        .await?
        .ok_or(SharedSlotError::NotFound)?;

    Ok(Json(SharedSlotView {
        id: slot.id,
        teacher_name: slot.teacher_name,
        student_name: slot.student_name,
        lesson_title: slot.lesson_title,
        amount: slot.amount,
        starts_at: slot.starts_at.assume_utc(),
        ends_at: slot.ends_at.assume_utc(),
        payment_status: slot.payment_status.into(),
    }))
}

/// Errors that can occur when redeeming a share link.
#[derive(Debug)]
enum SharedSlotError {
    Database(sqlx::Error),
    BadToken,
    Expired,
    NotFound,
}

impl From<sqlx::Error> for SharedSlotError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl From<SignatureError> for SharedSlotError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Expired => Self::Expired,
            _ => Self::BadToken,
        }
    }
}

impl IntoResponse for SharedSlotError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SharedSlotError::Database(e) => {
                tracing::error!(error = %e, "Shared-slot database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            SharedSlotError::BadToken => {
                (StatusCode::UNAUTHORIZED, "invalid share link").into_response()
            }
            SharedSlotError::Expired => {
                (StatusCode::UNAUTHORIZED, "share link expired").into_response()
            }
            SharedSlotError::NotFound => (StatusCode::NOT_FOUND, "slot not found").into_response(),
        }
    }
}
