use crate::entities::UserRole;
use crate::framework::DatabaseProcessor;
use compact_str::CompactString;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// IANA-style zone name or fixed offset string, e.g. `+09:00`. Only used
    /// for rendering times in emails.
    pub time_zone: Option<CompactString>,
    pub blocked: bool,
    pub email_verified: bool,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct GetUserById(pub Uuid);

impl Processor<GetUserById> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserById")]
    async fn process(&self, query: GetUserById) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, time_zone, blocked, email_verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(query.0)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Students a teacher may offer a special slot to: active, verified accounts.
#[derive(Debug, Clone, Copy)]
pub struct ListBookableStudents;

impl Processor<ListBookableStudents> for DatabaseProcessor {
    type Output = Vec<User>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListBookableStudents")]
    async fn process(&self, _query: ListBookableStudents) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, time_zone, blocked, email_verified, created_at
            FROM users
            WHERE role = 'student' AND NOT blocked AND email_verified
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
