use sqlx::PgPool;

/// Executes database queries and commands.
///
/// Every query/command is a plain struct with a
/// `kanau::processor::Processor` implementation on this type; multi-write
/// operations instead use `*_tx` associated functions on the entity types
/// so they can share one transaction.
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
