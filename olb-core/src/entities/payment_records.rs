use crate::entities::PaymentKind;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: Uuid,
    /// Provider-side payment id; the unique index on this column is the
    /// idempotency key for webhook deliveries.
    pub provider_payment_id: String,
    pub kind: PaymentKind,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub user_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPaymentRecord<'a> {
    pub provider_payment_id: &'a str,
    pub kind: PaymentKind,
    pub status: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub user_id: Uuid,
    pub lesson_id: Option<Uuid>,
}

impl PaymentRecord {
    /// Insert the record unless this provider payment was already processed.
    ///
    /// `ON CONFLICT DO NOTHING` on the unique `provider_payment_id` index
    /// makes redelivered webhooks a no-op: `None` means an earlier delivery
    /// (possibly a concurrent one) already won, and the caller must skip the
    /// branch writes. Because the branch writes share this transaction, a
    /// redelivered checkout can never create a second booking, wallet
    /// credit, pack, or bonus for the same provider payment.
    ///
    /// TODO: cover the unique-index race with `#[sqlx::test]` once a test
    /// database is wired up; the conflict path needs a live Postgres.
    pub async fn insert_if_absent_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new: NewPaymentRecord<'_>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO payment_records (
                id, provider_payment_id, kind, status, amount, currency,
                user_id, lesson_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (provider_payment_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.provider_payment_id)
        .bind(new.kind)
        .bind(new.status)
        .bind(new.amount)
        .bind(new.currency)
        .bind(new.user_id)
        .bind(new.lesson_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
