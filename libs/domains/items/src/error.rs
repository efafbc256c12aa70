use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TransactionError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Item not found: {0}")]
    NotFound(Uuid),

    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    #[error("Item {0} is referenced by bookings")]
    InUse(Uuid),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type ItemResult<T> = Result<T, ItemError>;

impl ItemError {
    /// Maps a failed item insert/update; a foreign-key violation can only come
    /// from `category_id`.
    pub(crate) fn from_item_write(err: DbErr, category_id: Option<Uuid>) -> Self {
        match (err.sql_err(), category_id) {
            (Some(SqlErr::ForeignKeyConstraintViolation(_)), Some(category_id)) => {
                Self::CategoryNotFound(category_id)
            }
            _ => err.into(),
        }
    }

    /// Maps a failed item delete; bookings restrict deletion of their item.
    pub(crate) fn from_item_delete(err: DbErr, id: Uuid) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Self::InUse(id),
            _ => err.into(),
        }
    }
}

impl From<DbErr> for ItemError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain errors raised inside the transaction pass through unchanged; storage
/// failures become [`ItemError::Transaction`] since the whole write was rolled back.
impl From<TransactionError<ItemError>> for ItemError {
    fn from(err: TransactionError<ItemError>) -> Self {
        match err {
            TransactionError::Operation(ItemError::Database(msg)) => Self::Transaction(msg),
            TransactionError::Operation(e) => e,
            TransactionError::Begin(e) | TransactionError::Commit(e) => {
                Self::Transaction(e.to_string())
            }
        }
    }
}

impl From<ItemError> for AppError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::Validation(e) => AppError::ValidationError(e),
            ItemError::NotFound(id) => AppError::NotFound(format!("Item {} not found", id)),
            ItemError::CategoryNotFound(id) => {
                AppError::NotFound(format!("Category {} not found", id))
            }
            ItemError::InUse(id) => {
                AppError::Conflict(format!("Item {} has bookings and cannot be deleted", id))
            }
            ItemError::Transaction(msg) => AppError::Transaction(msg),
            ItemError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for ItemError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_storage_failure_inside_transaction_is_transaction_error() {
        let err: ItemError =
            TransactionError::Operation(ItemError::Database("deadlock detected".into())).into();
        assert!(matches!(err, ItemError::Transaction(msg) if msg == "deadlock detected"));
    }

    #[test]
    fn test_domain_error_inside_transaction_is_preserved() {
        let id = Uuid::now_v7();
        let err: ItemError = TransactionError::Operation(ItemError::NotFound(id)).into();
        assert!(matches!(err, ItemError::NotFound(missing) if missing == id));
    }

    #[test]
    fn test_commit_failure_is_transaction_error() {
        let err: ItemError =
            TransactionError::<ItemError>::Commit(DbErr::Custom("connection reset".into())).into();
        assert!(matches!(err, ItemError::Transaction(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ItemError::NotFound(Uuid::now_v7()), StatusCode::NOT_FOUND),
            (ItemError::CategoryNotFound(Uuid::now_v7()), StatusCode::NOT_FOUND),
            (ItemError::InUse(Uuid::now_v7()), StatusCode::CONFLICT),
            (ItemError::Transaction("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ItemError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
