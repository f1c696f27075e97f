use crate::entities::SlotPaymentStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SpecialSlot {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub amount: Decimal,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub payment_status: SlotPaymentStatus,
    pub created_at: PrimitiveDateTime,
}

impl SpecialSlot {
    /// Mark the offered slot paid once the matching checkout completes.
    ///
    /// The webhook matches by offer coordinates rather than a slot id
    /// because the checkout metadata only carries who/what/when.
    pub async fn mark_paid_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        teacher_id: Uuid,
        student_id: Uuid,
        lesson_id: Uuid,
        starts_at: PrimitiveDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE special_slots
            SET payment_status = 'paid'
            WHERE teacher_id = $1 AND student_id = $2 AND lesson_id = $3
              AND starts_at = $4 AND payment_status = 'pending'
            RETURNING id
            "#,
        )
        .bind(teacher_id)
        .bind(student_id)
        .bind(lesson_id)
        .bind(starts_at)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InsertSpecialSlot {
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub amount: Decimal,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

impl Processor<InsertSpecialSlot> for DatabaseProcessor {
    type Output = SpecialSlot;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertSpecialSlot")]
    async fn process(&self, command: InsertSpecialSlot) -> Result<SpecialSlot, sqlx::Error> {
        sqlx::query_as::<_, SpecialSlot>(
            r#"
            INSERT INTO special_slots (
                id, teacher_id, student_id, lesson_id, amount, starts_at, ends_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, teacher_id, student_id, lesson_id, amount,
                      starts_at, ends_at, payment_status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(command.teacher_id)
        .bind(command.student_id)
        .bind(command.lesson_id)
        .bind(command.amount)
        .bind(command.starts_at)
        .bind(command.ends_at)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetSpecialSlotById(pub Uuid);

impl Processor<GetSpecialSlotById> for DatabaseProcessor {
    type Output = Option<SpecialSlot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSpecialSlotById")]
    async fn process(&self, query: GetSpecialSlotById) -> Result<Option<SpecialSlot>, sqlx::Error> {
        sqlx::query_as::<_, SpecialSlot>(
            r#"
            SELECT id, teacher_id, student_id, lesson_id, amount,
                   starts_at, ends_at, payment_status, created_at
            FROM special_slots
            WHERE id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Teacher's special slots, newest first, optionally filtered by payment
/// status.
#[derive(Debug, Clone, Copy)]
pub struct ListSpecialSlots {
    pub teacher_id: Uuid,
    pub status: Option<SlotPaymentStatus>,
}

impl Processor<ListSpecialSlots> for DatabaseProcessor {
    type Output = Vec<SpecialSlot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListSpecialSlots")]
    async fn process(&self, query: ListSpecialSlots) -> Result<Vec<SpecialSlot>, sqlx::Error> {
        sqlx::query_as::<_, SpecialSlot>(
            r#"
            SELECT id, teacher_id, student_id, lesson_id, amount,
                   starts_at, ends_at, payment_status, created_at
            FROM special_slots
            WHERE teacher_id = $1
              AND ($2::slot_payment_status IS NULL OR payment_status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.teacher_id)
        .bind(query.status)
        .fetch_all(&self.pool)
        .await
    }
}

/// A slot joined with display data, for the public share-link view and the
/// invite email.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SharedSlot {
    pub id: Uuid,
    pub teacher_name: String,
    pub student_name: String,
    pub student_email: String,
    pub student_time_zone: Option<String>,
    pub lesson_title: String,
    pub amount: Decimal,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub payment_status: SlotPaymentStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct GetSharedSlot(pub Uuid);

impl Processor<GetSharedSlot> for DatabaseProcessor {
    type Output = Option<SharedSlot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSharedSlot")]
    async fn process(&self, query: GetSharedSlot) -> Result<Option<SharedSlot>, sqlx::Error> {
        sqlx::query_as::<_, SharedSlot>(
            r#"
            SELECT sl.id, t.name AS teacher_name,
                   s.name AS student_name, s.email AS student_email,
                   s.time_zone AS student_time_zone,
                   l.title AS lesson_title, sl.amount, sl.starts_at,
                   sl.ends_at, sl.payment_status
            FROM special_slots sl
            JOIN users t ON t.id = sl.teacher_id
            JOIN users s ON s.id = sl.student_id
            JOIN lessons l ON l.id = sl.lesson_id
            WHERE sl.id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}
