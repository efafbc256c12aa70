use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::TransactionError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::models::BookingStatus;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Cannot move a {from} booking to {to}")]
    InvalidState {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking {0} is cancelled and can no longer be changed")]
    Cancelled(Uuid),

    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Item {item_id} is already booked by {booking_id} for an overlapping period")]
    Overlap { item_id: Uuid, booking_id: Uuid },

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type BookingResult<T> = Result<T, BookingError>;

impl BookingError {
    /// Maps a failed booking insert; the only foreign key is `item_id`.
    pub(crate) fn from_write(err: DbErr, item_id: Uuid) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Self::ItemNotFound(item_id),
            _ => err.into(),
        }
    }
}

impl From<DbErr> for BookingError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<TransactionError<BookingError>> for BookingError {
    fn from(err: TransactionError<BookingError>) -> Self {
        match err {
            TransactionError::Operation(BookingError::Database(msg)) => Self::Transaction(msg),
            TransactionError::Operation(e) => e,
            TransactionError::Begin(e) | TransactionError::Commit(e) => {
                Self::Transaction(e.to_string())
            }
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(e) => AppError::ValidationError(e),
            e @ (BookingError::InvalidState { .. } | BookingError::Cancelled(_)) => {
                AppError::BadRequest(e.to_string())
            }
            BookingError::NotFound(id) => AppError::NotFound(format!("Booking {} not found", id)),
            BookingError::ItemNotFound(id) => AppError::NotFound(format!("Item {} not found", id)),
            e @ BookingError::Overlap { .. } => AppError::Conflict(e.to_string()),
            BookingError::Transaction(msg) => AppError::Transaction(msg),
            BookingError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for BookingError {
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
    fn test_invalid_state_message() {
        let err = BookingError::InvalidState {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Confirmed,
        };
        assert_eq!(err.to_string(), "Cannot move a cancelled booking to confirmed");
    }

    #[test]
    fn test_storage_failure_inside_transaction_is_transaction_error() {
        let err: BookingError =
            TransactionError::Operation(BookingError::Database("serialization failure".into()))
                .into();
        assert!(matches!(err, BookingError::Transaction(_)));
    }

    #[test]
    fn test_overlap_inside_transaction_is_preserved() {
        let err: BookingError = TransactionError::Operation(BookingError::Overlap {
            item_id: Uuid::now_v7(),
            booking_id: Uuid::now_v7(),
        })
        .into();
        assert!(matches!(err, BookingError::Overlap { .. }));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                BookingError::InvalidState {
                    from: BookingStatus::Cancelled,
                    to: BookingStatus::Confirmed,
                },
                StatusCode::BAD_REQUEST,
            ),
            (BookingError::Cancelled(Uuid::now_v7()), StatusCode::BAD_REQUEST),
            (BookingError::NotFound(Uuid::now_v7()), StatusCode::NOT_FOUND),
            (BookingError::ItemNotFound(Uuid::now_v7()), StatusCode::NOT_FOUND),
            (
                BookingError::Overlap {
                    item_id: Uuid::now_v7(),
                    booking_id: Uuid::now_v7(),
                },
                StatusCode::CONFLICT,
            ),
            (BookingError::Transaction("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (BookingError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
