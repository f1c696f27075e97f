use crate::entities::WalletDirection;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: Decimal,
}

impl Wallet {
    /// Credit a user's wallet, creating it on first top-up, and append the
    /// ledger entry with the post-credit balance. Both writes share the
    /// webhook transaction.
    pub async fn credit_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        amount: Decimal,
        payment_id: Uuid,
    ) -> Result<Decimal, sqlx::Error> {
        let (balance_after,): (Decimal,) = sqlx::query_as(
            r#"
            INSERT INTO wallets (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = wallets.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                id, user_id, direction, amount, reason, payment_id, balance_after
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(WalletDirection::Credit)
        .bind(amount)
        .bind("wallet top-up")
        .bind(payment_id)
        .bind(balance_after)
        .execute(&mut **tx)
        .await?;

        Ok(balance_after)
    }
}
