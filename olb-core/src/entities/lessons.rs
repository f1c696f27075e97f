use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub deleted: bool,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct GetLessonById(pub Uuid);

impl Processor<GetLessonById> for DatabaseProcessor {
    type Output = Option<Lesson>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLessonById")]
    async fn process(&self, query: GetLessonById) -> Result<Option<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, teacher_id, title, price, duration_minutes, deleted, created_at
            FROM lessons
            WHERE id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Active (non-deleted) lessons of one teacher.
#[derive(Debug, Clone, Copy)]
pub struct ListLessonsByTeacher(pub Uuid);

impl Processor<ListLessonsByTeacher> for DatabaseProcessor {
    type Output = Vec<Lesson>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListLessonsByTeacher")]
    async fn process(&self, query: ListLessonsByTeacher) -> Result<Vec<Lesson>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, teacher_id, title, price, duration_minutes, deleted, created_at
            FROM lessons
            WHERE teacher_id = $1 AND NOT deleted
            ORDER BY created_at
            "#,
        )
        .bind(query.0)
        .fetch_all(&self.pool)
        .await
    }
}
