use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ItemError, ItemResult};
use crate::models::{
    AddPhotos, CreateItem, DeletePhotos, ItemDetails, ItemFilter, ItemPhoto, ItemSummary,
    PhotoCount, UpdateItem,
};
use crate::repository::ItemRepository;

/// Item and photo use cases.
///
/// Mutations return the re-read [`ItemDetails`] so callers always see the
/// committed state, including the recomputed `has_photos`.
pub struct ItemService<R: ItemRepository> {
    repository: Arc<R>,
}

impl<R: ItemRepository> Clone for ItemService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    async fn details(&self, id: Uuid) -> ItemResult<ItemDetails> {
        self.repository
            .get_details(id)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    #[instrument(skip(self, input), fields(author_id = %input.author_id, photos = input.photos.len()))]
    pub async fn create_item(&self, input: CreateItem) -> ItemResult<ItemDetails> {
        input.validate()?;
        let item = self.repository.create(input).await?;
        self.details(item.id).await
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: Uuid) -> ItemResult<ItemDetails> {
        self.details(id).await
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: ItemFilter) -> ItemResult<Vec<ItemSummary>> {
        filter.validate()?;
        self.repository.list(filter).await
    }

    /// `location` replaces any location in `filter`.
    #[instrument(skip(self, filter))]
    pub async fn list_by_location(
        &self,
        location: String,
        filter: ItemFilter,
    ) -> ItemResult<Vec<ItemSummary>> {
        self.list_items(ItemFilter {
            location: Some(location),
            ..filter
        })
        .await
    }

    #[instrument(skip(self, filter))]
    pub async fn list_by_category(
        &self,
        category_id: Uuid,
        filter: ItemFilter,
    ) -> ItemResult<Vec<ItemSummary>> {
        self.list_items(ItemFilter {
            category_id: Some(category_id),
            ..filter
        })
        .await
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(&self, id: Uuid, input: UpdateItem) -> ItemResult<ItemDetails> {
        input.validate()?;
        self.repository.update(id, input).await?;
        self.details(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Uuid) -> ItemResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(ItemError::NotFound(id))
        }
    }

    #[instrument(skip(self))]
    pub async fn list_photos(&self, item_id: Uuid) -> ItemResult<Vec<ItemPhoto>> {
        self.repository.list_photos(item_id).await
    }

    #[instrument(skip(self, input), fields(urls = input.urls.len()))]
    pub async fn add_photos(&self, item_id: Uuid, input: AddPhotos) -> ItemResult<ItemDetails> {
        input.validate()?;
        self.repository.add_photos(item_id, input.urls).await?;
        self.details(item_id).await
    }

    #[instrument(skip(self, input), fields(photo_ids = input.photo_ids.len()))]
    pub async fn delete_photos(
        &self,
        item_id: Uuid,
        input: DeletePhotos,
    ) -> ItemResult<ItemDetails> {
        self.repository
            .delete_photos(item_id, input.photo_ids)
            .await?;
        self.details(item_id).await
    }

    #[instrument(skip(self))]
    pub async fn count_photos(&self, item_id: Uuid) -> ItemResult<PhotoCount> {
        let count = self.repository.count_photos(item_id).await?;
        Ok(PhotoCount {
            item_id,
            count,
            has_photos: count > 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::repository::MockItemRepository;
    use chrono::Utc;
    use mockall::predicate::{always, eq};

    fn item(id: Uuid, has_photos: bool) -> Item {
        Item {
            id,
            title: "Kayak".to_string(),
            description: "Two seat sea kayak".to_string(),
            price: 3000,
            location: "Split".to_string(),
            has_photos,
            author_id: Uuid::now_v7(),
            category_id: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn details(id: Uuid, has_photos: bool) -> ItemDetails {
        ItemDetails {
            item: item(id, has_photos),
            photos: vec![],
            category: None,
        }
    }

    #[tokio::test]
    async fn test_add_photos_returns_reread_details() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_add_photos()
            .with(eq(id), always())
            .times(1)
            .returning(|_, urls| Ok(urls.len() as u64));
        mock_repo
            .expect_get_details()
            .with(eq(id))
            .times(1)
            .returning(|id| Ok(Some(details(id, true))));

        let service = ItemService::new(mock_repo);
        let result = service
            .add_photos(
                id,
                AddPhotos {
                    urls: vec!["https://cdn.example.com/1.jpg".into()],
                },
            )
            .await
            .unwrap();

        assert!(result.item.has_photos);
    }

    #[tokio::test]
    async fn test_add_photos_rejects_invalid_url_before_storage() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_add_photos().never();

        let service = ItemService::new(mock_repo);
        let err = service
            .add_photos(
                Uuid::now_v7(),
                AddPhotos {
                    urls: vec!["not a url".into()],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ItemError::Validation(_)));
    }

    #[tokio::test]
    async fn test_count_photos_derives_flag() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_count_photos()
            .with(eq(id))
            .returning(|_| Ok(0));

        let service = ItemService::new(mock_repo);
        let count = service.count_photos(id).await.unwrap();

        assert_eq!(
            count,
            PhotoCount {
                item_id: id,
                count: 0,
                has_photos: false
            }
        );
    }

    #[tokio::test]
    async fn test_list_by_category_sets_category_filter() {
        let category_id = Uuid::now_v7();
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_list()
            .withf(move |filter| {
                filter.category_id == Some(category_id) && filter.limit == Some(5)
            })
            .returning(|_| Ok(vec![]));

        let service = ItemService::new(mock_repo);
        let items = service
            .list_by_category(
                category_id,
                ItemFilter {
                    limit: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_negative_price_bound() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_list().never();

        let service = ItemService::new(mock_repo);
        let err = service
            .list_items(ItemFilter {
                min_price: Some(-1),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ItemError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_item_is_not_found() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo.expect_get_details().returning(|_| Ok(None));

        let service = ItemService::new(mock_repo);
        let err = service.get_item(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, ItemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_in_use_item_is_propagated() {
        let mut mock_repo = MockItemRepository::new();
        mock_repo
            .expect_delete()
            .returning(|id| Err(ItemError::InUse(id)));

        let service = ItemService::new(mock_repo);
        let err = service.delete_item(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, ItemError::InUse(_)));
    }
}
