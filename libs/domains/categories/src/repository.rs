use async_trait::async_trait;
use database::Page;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CategoryFilter, CreateCategory, UpdateCategory};

/// Category persistence.
///
/// Names are unique; both implementations report a clash as
/// [`CategoryError::DuplicateName`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, input: CreateCategory) -> CategoryResult<Category>;

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>>;

    /// Ordered by name ascending.
    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>>;

    async fn update(&self, id: Uuid, input: UpdateCategory) -> CategoryResult<Category>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> CategoryResult<bool>;
}

/// In-memory implementation for tests and local development
#[derive(Debug, Default, Clone)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(categories: &HashMap<Uuid, Category>, name: &str, except: Option<Uuid>) -> bool {
    categories
        .values()
        .any(|c| c.name == name && Some(c.id) != except)
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, input: CreateCategory) -> CategoryResult<Category> {
        let mut categories = self.categories.write().await;

        if name_taken(&categories, &input.name, None) {
            return Err(CategoryError::DuplicateName(input.name));
        }

        let category = Category::new(input);
        categories.insert(category.id, category.clone());

        tracing::info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.get(&id).cloned())
    }

    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        let categories = self.categories.read().await;

        let mut result: Vec<Category> = categories.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(Page::new(filter.limit, filter.offset).slice(result))
    }

    async fn update(&self, id: Uuid, input: UpdateCategory) -> CategoryResult<Category> {
        let mut categories = self.categories.write().await;

        if let Some(name) = &input.name {
            if name_taken(&categories, name, Some(id)) {
                return Err(CategoryError::DuplicateName(name.clone()));
            }
        }

        let category = categories
            .get_mut(&id)
            .ok_or(CategoryError::NotFound(id))?;
        category.apply_update(input);

        tracing::info!(category_id = %id, "Updated category");
        Ok(category.clone())
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let mut categories = self.categories.write().await;
        let removed = categories.remove(&id).is_some();
        if removed {
            tracing::info!(category_id = %id, "Deleted category");
        }
        Ok(removed)
    }
}
