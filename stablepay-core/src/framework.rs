//! Database handle that the entity processors are implemented on.

use sqlx::PgPool;

/// Runs entity queries against the pool. Each query type implements
/// `kanau::processor::Processor` for this struct.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
