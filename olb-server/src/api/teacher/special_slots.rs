//! Special-slot offers and their share links.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use olb_core::entities::availability_blocks::AvailabilityBlock;
use olb_core::entities::availability_blocks::ListBlocksByTeacher;
use olb_core::entities::special_slots::{InsertSpecialSlot, ListSpecialSlots, SpecialSlot};
use olb_core::entities::users::GetUserById;
use olb_core::entities::UserRole;
use olb_core::events::types::EmailEvent;
use olb_core::framework::DatabaseProcessor;
use olb_core::scheduling::{self, BlockWindow, Window};
use olb_sdk::objects::{
    CreateSpecialSlotRequest, SlotPaymentStatus as SdkSlotPaymentStatus, SpecialSlotResponse,
};
use olb_sdk::signature::{self, SHARE_TOKEN_TTL};
use serde::Deserialize;

use crate::api::extractors::AuthedTeacher;
use crate::state::AppState;

fn to_response(slot: &SpecialSlot) -> SpecialSlotResponse {
    SpecialSlotResponse {
        id: slot.id,
        teacher_id: slot.teacher_id,
        student_id: slot.student_id,
        lesson_id: slot.lesson_id,
        amount: slot.amount,
        starts_at: slot.starts_at.assume_utc(),
        ends_at: slot.ends_at.assume_utc(),
        payment_status: slot.payment_status.into(),
        created_at: slot.created_at.assume_utc(),
    }
}

/// `POST /api/teacher/special-slots` — offer a slot outside declared
/// availability and send the student a signed share link.
pub async fn create(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Json(request): Json<CreateSpecialSlotRequest>,
) -> Result<impl IntoResponse, SpecialSlotApiError> {
    let window = Window::new(
        scheduling::to_utc(request.starts_at),
        scheduling::to_utc(request.ends_at),
    );
    if !window.is_valid() {
        return Err(SpecialSlotApiError::InvalidWindow);
    }

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let blocks = processor
        .process(ListBlocksByTeacher(teacher.teacher_id))
        .await?;
    let windows: Vec<BlockWindow> = blocks.iter().map(AvailabilityBlock::window).collect();
    if scheduling::overlaps_any(&windows, &window) {
        return Err(SpecialSlotApiError::InsideAvailability);
    }

    let student = processor
        .process(GetUserById(request.student_id))
        .await?
        .filter(|u| u.role == UserRole::Student && !u.blocked)
        .ok_or(SpecialSlotApiError::UnknownStudent)?;

    let slot = processor
        .process(InsertSpecialSlot {
            teacher_id: teacher.teacher_id,
            student_id: student.id,
            lesson_id: request.lesson_id,
            amount: request.amount,
            starts_at: window.starts_at,
            ends_at: window.ends_at,
        })
        .await?;

    // Mint the 48-hour share link and hand it to the dispatcher.
    let links = state.config.links.read().await;
    let token = signature::issue_token(slot.id, SHARE_TOKEN_TTL, links.share_secret());
    let share_link = links
        .share_base_url
        .join(&format!("slot/{token}"))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}slot/{token}", links.share_base_url));
    drop(links);

    if let Err(e) = state
        .events
        .email
        .send(EmailEvent::SpecialSlotInvite {
            slot_id: slot.id,
            share_link,
        })
        .await
    {
        tracing::error!(error = %e, "Failed to queue special-slot invite email");
    }

    Ok((StatusCode::CREATED, Json(to_response(&slot))))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<SdkSlotPaymentStatus>,
}

/// `GET /api/teacher/special-slots?status=pending|paid` — newest first.
pub async fn list(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, SpecialSlotApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let slots = processor
        .process(ListSpecialSlots {
            teacher_id: teacher.teacher_id,
            status: query.status.map(Into::into),
        })
        .await?;
    let response: Vec<SpecialSlotResponse> = slots.iter().map(to_response).collect();
    Ok(Json(response))
}

/// Errors that can occur in special-slot handlers.
#[derive(Debug)]
pub enum SpecialSlotApiError {
    Database(sqlx::Error),
    InvalidWindow,
    InsideAvailability,
    UnknownStudent,
}

impl From<sqlx::Error> for SpecialSlotApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for SpecialSlotApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SpecialSlotApiError::Database(e) => {
                tracing::error!(error = %e, "Special-slot API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            SpecialSlotApiError::InvalidWindow => (
                StatusCode::BAD_REQUEST,
                "start time must be before end time",
            )
                .into_response(),
            SpecialSlotApiError::InsideAvailability => (
                StatusCode::BAD_REQUEST,
                "special slots are not allowed inside declared availability",
            )
                .into_response(),
            SpecialSlotApiError::UnknownStudent => {
                (StatusCode::BAD_REQUEST, "unknown student").into_response()
            }
        }
    }
}
