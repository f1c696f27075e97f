use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BulkLesson {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub payment_id: Uuid,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub admin_commission: Decimal,
    pub processing_fee: Decimal,
    pub lessons_total: i32,
    pub lessons_remaining: i32,
    pub created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBulkLesson {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub payment_id: Uuid,
    pub total_amount: Decimal,
    pub teacher_earning: Decimal,
    pub admin_commission: Decimal,
    pub processing_fee: Decimal,
    pub lessons_total: i32,
}

impl BulkLesson {
    /// Insert a pack with all lessons still unredeemed.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewBulkLesson,
    ) -> Result<BulkLesson, sqlx::Error> {
        sqlx::query_as::<_, BulkLesson>(
            r#"
            INSERT INTO bulk_lessons (
                id, teacher_id, student_id, lesson_id, payment_id, total_amount,
                teacher_earning, admin_commission, processing_fee,
                lessons_total, lessons_remaining
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING
                id, teacher_id, student_id, lesson_id, payment_id, total_amount,
                teacher_earning, admin_commission, processing_fee,
                lessons_total, lessons_remaining, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.teacher_id)
        .bind(new.student_id)
        .bind(new.lesson_id)
        .bind(new.payment_id)
        .bind(new.total_amount)
        .bind(new.teacher_earning)
        .bind(new.admin_commission)
        .bind(new.processing_fee)
        .bind(new.lessons_total)
        .fetch_one(&mut **tx)
        .await
    }
}

/// Display data for the bulk-purchase emails.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BulkLessonNotification {
    pub pack_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub teacher_name: String,
    pub teacher_email: String,
    pub lesson_title: String,
    pub lessons_total: i32,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct GetBulkLessonNotification(pub Uuid);

impl Processor<GetBulkLessonNotification> for DatabaseProcessor {
    type Output = Option<BulkLessonNotification>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBulkLessonNotification")]
    async fn process(
        &self,
        query: GetBulkLessonNotification,
    ) -> Result<Option<BulkLessonNotification>, sqlx::Error> {
        sqlx::query_as::<_, BulkLessonNotification>(
            r#"
            SELECT p.id AS pack_id,
                   s.name AS student_name, s.email AS student_email,
                   t.name AS teacher_name, t.email AS teacher_email,
                   l.title AS lesson_title, p.lessons_total, p.total_amount
            FROM bulk_lessons p
            JOIN users s ON s.id = p.student_id
            JOIN users t ON t.id = p.teacher_id
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}
