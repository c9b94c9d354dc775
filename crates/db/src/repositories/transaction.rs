//! Transaction helpers shared by repositories and services.

use chatroom_common::{AppError, AppResult};
use sea_orm::{DatabaseTransaction, DbErr};

/// Map a store error raised at `step` inside a transaction.
pub(crate) fn step_error(step: &str, err: DbErr) -> AppError {
    AppError::Database(err.to_string()).context(step)
}

/// Commit `txn`.
pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| step_error("commit transaction", e))
}

/// Roll back `txn`. A failed rollback is logged; the connection discards the
/// transaction either way.
pub async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        tracing::warn!(error = %e, "Transaction rollback failed");
    }
}
