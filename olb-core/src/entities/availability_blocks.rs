use crate::framework::DatabaseProcessor;
use crate::scheduling::{BlockWindow, Window};
use kanau::processor::Processor;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub created_at: PrimitiveDateTime,
}

impl AvailabilityBlock {
    pub fn window(&self) -> BlockWindow {
        BlockWindow {
            id: self.id,
            window: Window::new(self.starts_at, self.ends_at),
        }
    }

    /// Insert a block within a transaction. Used together with
    /// [`AvailabilityBlock::delete_many_tx`] when adjacent blocks are merged
    /// into the new one.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        teacher_id: Uuid,
        window: Window,
    ) -> Result<AvailabilityBlock, sqlx::Error> {
        sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            INSERT INTO availability_blocks (id, teacher_id, starts_at, ends_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, teacher_id, starts_at, ends_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(teacher_id)
        .bind(window.starts_at)
        .bind(window.ends_at)
        .fetch_one(&mut **tx)
        .await
    }

    /// Delete absorbed blocks within the same transaction as the merged insert.
    pub async fn delete_many_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        teacher_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            DELETE FROM availability_blocks
            WHERE teacher_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(teacher_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListBlocksByTeacher(pub Uuid);

impl Processor<ListBlocksByTeacher> for DatabaseProcessor {
    type Output = Vec<AvailabilityBlock>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListBlocksByTeacher")]
    async fn process(&self, query: ListBlocksByTeacher) -> Result<Vec<AvailabilityBlock>, sqlx::Error> {
        sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            SELECT id, teacher_id, starts_at, ends_at, created_at
            FROM availability_blocks
            WHERE teacher_id = $1
            ORDER BY starts_at
            "#,
        )
        .bind(query.0)
        .fetch_all(&self.pool)
        .await
    }
}

/// Partial update of one endpoint or both. `None` keeps the stored value.
#[derive(Debug, Clone, Copy)]
pub struct UpdateBlock {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub starts_at: Option<PrimitiveDateTime>,
    pub ends_at: Option<PrimitiveDateTime>,
}

impl Processor<UpdateBlock> for DatabaseProcessor {
    type Output = Option<AvailabilityBlock>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateBlock")]
    async fn process(&self, command: UpdateBlock) -> Result<Option<AvailabilityBlock>, sqlx::Error> {
        sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            UPDATE availability_blocks
            SET starts_at = COALESCE($3, starts_at),
                ends_at = COALESCE($4, ends_at)
            WHERE id = $1 AND teacher_id = $2
            RETURNING id, teacher_id, starts_at, ends_at, created_at
            "#,
        )
        .bind(command.id)
        .bind(command.teacher_id)
        .bind(command.starts_at)
        .bind(command.ends_at)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteBlock {
    pub id: Uuid,
    pub teacher_id: Uuid,
}

impl Processor<DeleteBlock> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteBlock")]
    async fn process(&self, command: DeleteBlock) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM availability_blocks
            WHERE id = $1 AND teacher_id = $2
            "#,
        )
        .bind(command.id)
        .bind(command.teacher_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
