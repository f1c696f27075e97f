//! Lesson and student catalog for special-slot creation.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use olb_core::entities::lessons::ListLessonsByTeacher;
use olb_core::entities::users::ListBookableStudents;
use olb_core::framework::DatabaseProcessor;
use olb_sdk::objects::{CatalogLesson, CatalogResponse, CatalogStudent};

use crate::api::extractors::AuthedTeacher;
use crate::state::AppState;

/// `GET /api/teacher/catalog` — the teacher's active lessons plus students
/// who may receive a special-slot offer.
pub async fn show(
    State(state): State<AppState>,
    teacher: AuthedTeacher,
) -> Result<impl IntoResponse, CatalogApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let lessons = processor
        .process(ListLessonsByTeacher(teacher.teacher_id))
        .await?;
    let students = processor.process(ListBookableStudents).await?;

    Ok(Json(CatalogResponse {
        lessons: lessons
            .iter()
            .map(|l| CatalogLesson {
                id: l.id,
                title: l.title.clone(),
                price: l.price,
                duration_minutes: l.duration_minutes,
            })
            .collect(),
        students: students
            .iter()
            .map(|s| CatalogStudent {
                id: s.id,
                name: s.name.clone(),
                email: s.email.clone(),
            })
            .collect(),
    }))
}

/// Errors that can occur in catalog handlers.
#[derive(Debug)]
pub enum CatalogApiError {
    Database(sqlx::Error),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CatalogApiError::Database(e) => {
                tracing::error!(error = %e, "Catalog API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
