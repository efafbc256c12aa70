//! Scoped transaction gateway.
//!
//! A closure receives the open [`DatabaseTransaction`]; `Ok` commits and `Err`
//! rolls back. A transaction dropped without either (panic, cancelled request)
//! is rolled back by the driver when the connection returns to the pool.

use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Future returned by a [`with_transaction`] body, borrowing the transaction.
pub type TransactionFuture<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E> {
    #[error("failed to begin transaction: {0}")]
    Begin(DbErr),

    #[error("failed to commit transaction: {0}")]
    Commit(DbErr),

    #[error("{0}")]
    Operation(E),
}

/// Runs `operation` inside a single transaction.
///
/// ```ignore
/// let details = with_transaction(&db, move |txn| {
///     Box::pin(async move { add_photos_in(txn, item_id, urls).await })
/// })
/// .await?;
/// ```
///
/// The body should delegate to a function with a concrete error type so that
/// `E` is inferred.
pub async fn with_transaction<C, F, T, E>(db: &C, operation: F) -> Result<T, TransactionError<E>>
where
    C: TransactionTrait<Transaction = DatabaseTransaction> + Sync,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TransactionFuture<'c, T, E> + Send,
    T: Send,
    E: Display + Send,
{
    let txn = db.begin().await.map_err(TransactionError::Begin)?;
    debug!("Transaction started");

    let outcome = operation(&txn).await;

    match outcome {
        Ok(value) => {
            txn.commit().await.map_err(TransactionError::Commit)?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            debug!(error = %e, "Transaction rolled back");
            Err(TransactionError::Operation(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_commit_returns_value() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result: Result<u32, TransactionError<String>> =
            with_transaction(&db, |_txn| Box::pin(async move { Ok(42) })).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_operation_error_is_returned() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result: Result<u32, TransactionError<String>> = with_transaction(&db, |_txn| {
            Box::pin(async move { Err("item not found".to_string()) })
        })
        .await;

        match result {
            Err(TransactionError::Operation(msg)) => assert_eq!(msg, "item not found"),
            other => panic!("expected operation error, got {:?}", other),
        }
    }
}
