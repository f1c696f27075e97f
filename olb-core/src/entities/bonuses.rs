use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Bonus {
    pub id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub lesson_id: Uuid,
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBonus<'a> {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub lesson_id: Uuid,
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: &'a str,
}

impl Bonus {
    /// Insert a bonus tip a student paid on top of a finished booking.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewBonus<'_>,
    ) -> Result<Bonus, sqlx::Error> {
        sqlx::query_as::<_, Bonus>(
            r#"
            INSERT INTO bonuses (
                id, student_id, teacher_id, lesson_id, booking_id, payment_id,
                amount, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, student_id, teacher_id, lesson_id, booking_id,
                      payment_id, amount, currency, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.student_id)
        .bind(new.teacher_id)
        .bind(new.lesson_id)
        .bind(new.booking_id)
        .bind(new.payment_id)
        .bind(new.amount)
        .bind(new.currency)
        .fetch_one(&mut **tx)
        .await
    }
}
