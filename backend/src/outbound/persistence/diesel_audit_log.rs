//! PostgreSQL-backed `AuditLog`.

use async_trait::async_trait;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::AuditEntry;
use crate::domain::ports::{AuditLog, PersistenceError};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::NewAuditRow;
use super::pool::DbPool;
use super::schema::audit_log;

/// Appends to `audit_log`.
#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
}

impl DieselAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Append an entry on an existing connection, inside the caller's
/// transaction when there is one.
pub(crate) async fn append_audit(
    conn: &mut AsyncPgConnection,
    entry: &AuditEntry,
) -> diesel::QueryResult<()> {
    diesel::insert_into(audit_log::table)
        .values(NewAuditRow::from(entry))
        .execute(conn)
        .await
        .map(|_| ())
}

#[async_trait]
impl AuditLog for DieselAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        append_audit(&mut conn, entry)
            .await
            .map_err(map_diesel_error)
    }
}
