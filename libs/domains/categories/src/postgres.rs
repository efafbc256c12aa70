use async_trait::async_trait;
use chrono::Utc;
use database::{BaseRepository, Page};
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder};
use uuid::Uuid;

use crate::{
    entity,
    error::{CategoryError, CategoryResult},
    models::{Category, CategoryFilter, CreateCategory, UpdateCategory},
    repository::CategoryRepository,
};

pub struct PgCategoryRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, input: CreateCategory) -> CategoryResult<Category> {
        let category = Category::new(input);
        let name = category.name.clone();

        let model = self
            .base
            .insert(category.into())
            .await
            .map_err(|e| CategoryError::from_write(e, &name))?;

        tracing::info!(category_id = %model.id, "Created category");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: CategoryFilter) -> CategoryResult<Vec<Category>> {
        let query = entity::Entity::find()
            .order_by_asc(entity::Column::Name)
            .order_by_asc(entity::Column::Id);

        let models = Page::new(filter.limit, filter.offset)
            .apply(query)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, input: UpdateCategory) -> CategoryResult<Category> {
        let existing = self
            .base
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let Some(name) = input.name else {
            return Ok(existing.into());
        };

        let mut active = existing.into_active_model();
        active.name = Set(name.clone());
        active.updated_at = Set(Utc::now().into());

        let model = self
            .base
            .update(active)
            .await
            .map_err(|e| CategoryError::from_write(e, &name))?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let rows = self.base.delete_by_id(id).await?;
        if rows > 0 {
            tracing::info!(category_id = %id, "Deleted category");
        }
        Ok(rows > 0)
    }
}
