use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Category not found: {0}")]
    NotFound(Uuid),

    #[error("Category '{0}' already exists")]
    DuplicateName(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

impl CategoryError {
    /// Maps an insert/update failure, turning the unique index on `name` into
    /// [`CategoryError::DuplicateName`].
    pub(crate) fn from_write(err: DbErr, name: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateName(name.to_string()),
            _ => err.into(),
        }
    }
}

impl From<DbErr> for CategoryError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Validation(e) => AppError::ValidationError(e),
            CategoryError::NotFound(id) => AppError::NotFound(format!("Category {} not found", id)),
            CategoryError::DuplicateName(name) => {
                AppError::Conflict(format!("Category '{}' already exists", name))
            }
            CategoryError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for CategoryError {
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
    fn test_duplicate_name_maps_to_conflict() {
        let response = CategoryError::DuplicateName("Tools".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let err: CategoryError = DbErr::Custom("boom".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_unique_write_error_is_database_error() {
        let err = CategoryError::from_write(DbErr::Custom("timeout".into()), "Tools");
        assert!(matches!(err, CategoryError::Database(_)));
    }
}
