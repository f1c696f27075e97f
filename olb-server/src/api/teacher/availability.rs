//! Availability block management and the derived schedule.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use olb_core::entities::availability_blocks::{
    AvailabilityBlock, DeleteBlock, ListBlocksByTeacher, UpdateBlock,
};
use olb_core::entities::bookings::ListBookingsForSchedule;
use olb_core::framework::DatabaseProcessor;
use olb_core::scheduling::{self, BlockWindow, Window};
use olb_sdk::objects::{
    AddAvailabilityRequest, AvailabilityBlockResponse, BookedSlotResponse,
    DerivedScheduleResponse, FreeSlotResponse, UpdateAvailabilityRequest,
};
use uuid::Uuid;

use crate::api::extractors::AuthedTeacher;
use crate::state::AppState;

fn to_block_response(block: &AvailabilityBlock) -> AvailabilityBlockResponse {
    AvailabilityBlockResponse {
        id: block.id,
        teacher_id: block.teacher_id,
        starts_at: block.starts_at.assume_utc(),
        ends_at: block.ends_at.assume_utc(),
    }
}

/// `POST /api/teacher/availability` — add a block.
///
/// Rejects inverted windows and overlaps; exactly adjacent blocks are
/// merged into the new one.
pub async fn add(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Json(request): Json<AddAvailabilityRequest>,
) -> Result<impl IntoResponse, AvailabilityApiError> {
    let window = Window::new(
        scheduling::to_utc(request.starts_at),
        scheduling::to_utc(request.ends_at),
    );
    if !window.is_valid() {
        return Err(AvailabilityApiError::InvalidWindow);
    }

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let blocks = processor
        .process(ListBlocksByTeacher(teacher.teacher_id))
        .await?;
    let windows: Vec<BlockWindow> = blocks.iter().map(AvailabilityBlock::window).collect();

    let outcome =
        scheduling::merge_window(&windows, window).map_err(|_| AvailabilityApiError::Overlap)?;

    let mut tx = state.db.begin().await?;
    AvailabilityBlock::delete_many_tx(&mut tx, teacher.teacher_id, &outcome.absorbed).await?;
    let block = AvailabilityBlock::insert_tx(&mut tx, teacher.teacher_id, outcome.window).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(to_block_response(&block))))
}

/// `GET /api/teacher/availability` — the derived schedule.
///
/// Availability blocks minus non-cancelled bookings, with the post-lesson
/// buffer applied.
pub async fn schedule(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
) -> Result<impl IntoResponse, AvailabilityApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let blocks = processor
        .process(ListBlocksByTeacher(teacher.teacher_id))
        .await?;
    let bookings = processor
        .process(ListBookingsForSchedule(teacher.teacher_id))
        .await?;

    let block_windows: Vec<BlockWindow> = blocks.iter().map(AvailabilityBlock::window).collect();
    let booking_windows: Vec<_> = bookings.iter().map(|b| b.window()).collect();
    let derived = scheduling::derive_schedule(&block_windows, &booking_windows);

    let response = DerivedScheduleResponse {
        availability_blocks: derived
            .free
            .iter()
            .map(|slot| FreeSlotResponse {
                id: slot.block_id,
                teacher_id: teacher.teacher_id,
                starts_at: slot.window.starts_at.assume_utc(),
                ends_at: slot.window.ends_at.assume_utc(),
            })
            .collect(),
        booked_slots: derived
            .booked
            .iter()
            .map(|slot| BookedSlotResponse {
                teacher_id: teacher.teacher_id,
                student_id: slot.student_id,
                lesson_id: slot.lesson_id,
                starts_at: slot.window.starts_at.assume_utc(),
                ends_at: slot.window.ends_at.assume_utc(),
            })
            .collect(),
    };
    Ok(Json(response))
}

/// `PUT /api/teacher/availability/{id}` — move one or both endpoints.
pub async fn update(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<impl IntoResponse, AvailabilityApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let blocks = processor
        .process(ListBlocksByTeacher(teacher.teacher_id))
        .await?;
    let current = blocks
        .iter()
        .find(|b| b.id == id)
        .ok_or(AvailabilityApiError::NotFound)?;

    let starts_at = request.starts_at.map(scheduling::to_utc);
    let ends_at = request.ends_at.map(scheduling::to_utc);
    let resulting = Window::new(
        starts_at.unwrap_or(current.starts_at),
        ends_at.unwrap_or(current.ends_at),
    );
    if !resulting.is_valid() {
        return Err(AvailabilityApiError::InvalidWindow);
    }

    let updated = processor
        .process(UpdateBlock {
            id,
            teacher_id: teacher.teacher_id,
            starts_at,
            ends_at,
        })
        .await?
        .ok_or(AvailabilityApiError::NotFound)?;

    Ok(Json(to_block_response(&updated)))
}

/// `DELETE /api/teacher/availability/{id}`.
pub async fn remove(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AvailabilityApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let deleted = processor
        .process(DeleteBlock {
            id,
            teacher_id: teacher.teacher_id,
        })
        .await?;
    if deleted == 0 {
        return Err(AvailabilityApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Errors that can occur in availability handlers.
#[derive(Debug)]
pub enum AvailabilityApiError {
    Database(sqlx::Error),
    InvalidWindow,
    Overlap,
    NotFound,
}

impl From<sqlx::Error> for AvailabilityApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for AvailabilityApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AvailabilityApiError::Database(e) => {
                tracing::error!(error = %e, "Availability API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AvailabilityApiError::InvalidWindow => (
                StatusCode::BAD_REQUEST,
                "start time must be before end time",
            )
                .into_response(),
            AvailabilityApiError::Overlap => (
                StatusCode::BAD_REQUEST,
                "availability overlaps with existing schedule",
            )
                .into_response(),
            AvailabilityApiError::NotFound => {
                (StatusCode::NOT_FOUND, "availability block not found").into_response()
            }
        }
    }
}
