use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CategoryFilter, CreateCategory, UpdateCategory};
use crate::repository::CategoryRepository;

/// Category business logic
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
}

impl<R: CategoryRepository> Clone for CategoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a category; the name is stored trimmed.
    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: CreateCategory) -> CategoryResult<Category> {
        input.validate()?;
        self.repository.create(input.normalized()).await
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> CategoryResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        self.repository.list(filter).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        input.validate()?;
        self.repository.update(id, input.normalized()).await
    }

    /// Items in the category keep existing with `category_id = NULL`.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> CategoryResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(CategoryError::NotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCategoryRepository;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_trims_name_before_storing() {
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo
            .expect_create()
            .with(eq(CreateCategory {
                name: "Tools".to_string(),
            }))
            .times(1)
            .returning(|input| Ok(category(&input.name)));

        let service = CategoryService::new(mock_repo);
        let created = service
            .create_category(CreateCategory {
                name: "  Tools  ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.name, "Tools");
    }

    #[tokio::test]
    async fn test_create_invalid_never_reaches_repository() {
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo.expect_create().never();

        let service = CategoryService::new(mock_repo);
        let err = service
            .create_category(CreateCategory {
                name: String::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CategoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(id))
            .returning(|_| Ok(None));

        let service = CategoryService::new(mock_repo);
        let err = service.get_category(id).await.unwrap_err();

        assert!(matches!(err, CategoryError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo.expect_delete().returning(|_| Ok(false));

        let service = CategoryService::new(mock_repo);
        let err = service.delete_category(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, CategoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_propagated() {
        let mut mock_repo = MockCategoryRepository::new();
        mock_repo
            .expect_update()
            .returning(|_, input| Err(CategoryError::DuplicateName(input.name.unwrap_or_default())));

        let service = CategoryService::new(mock_repo);
        let err = service
            .update_category(
                Uuid::now_v7(),
                UpdateCategory {
                    name: Some("Tools".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CategoryError::DuplicateName(name) if name == "Tools"));
    }
}
