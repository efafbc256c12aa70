use async_trait::async_trait;
use database::Page;
use domain_categories::{Category, CategoryRepository, InMemoryCategoryRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ItemError, ItemResult};
use crate::models::{
    CreateItem, Item, ItemDetails, ItemFilter, ItemPhoto, ItemSummary, UpdateItem,
};

/// Item and photo persistence.
///
/// Every method that changes the photo set also rewrites `has_photos` from a
/// fresh count, atomically with the change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Inserts the item and its photos as one unit.
    async fn create(&self, input: CreateItem) -> ItemResult<Item>;

    async fn get_by_id(&self, id: Uuid) -> ItemResult<Option<Item>>;

    /// Item with photos (oldest first) and category.
    async fn get_details(&self, id: Uuid) -> ItemResult<Option<ItemDetails>>;

    /// Newest first, each item with its category.
    async fn list(&self, filter: ItemFilter) -> ItemResult<Vec<ItemSummary>>;

    /// Merges the patch, re-validates the merged item and applies photo
    /// additions/deletions, all in one unit.
    async fn update(&self, id: Uuid, input: UpdateItem) -> ItemResult<Item>;

    /// Returns `false` when nothing was deleted. Photos go with the item.
    async fn delete(&self, id: Uuid) -> ItemResult<bool>;

    /// Oldest first.
    async fn list_photos(&self, item_id: Uuid) -> ItemResult<Vec<ItemPhoto>>;

    /// Returns the photo count after the insert.
    async fn add_photos(&self, item_id: Uuid, urls: Vec<String>) -> ItemResult<u64>;

    /// Returns the number of photos removed. Ids of other items' photos are
    /// skipped.
    async fn delete_photos(&self, item_id: Uuid, photo_ids: Vec<Uuid>) -> ItemResult<u64>;

    async fn count_photos(&self, item_id: Uuid) -> ItemResult<u64>;
}

#[derive(Debug, Default)]
struct Store {
    items: HashMap<Uuid, Item>,
    photos: HashMap<Uuid, ItemPhoto>,
}

impl Store {
    fn photo_count(&self, item_id: Uuid) -> u64 {
        self.photos.values().filter(|p| p.item_id == item_id).count() as u64
    }

    fn photos_of(&self, item_id: Uuid) -> Vec<ItemPhoto> {
        let mut photos: Vec<ItemPhoto> = self
            .photos
            .values()
            .filter(|p| p.item_id == item_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        photos
    }

    fn insert_photos(&mut self, item_id: Uuid, urls: Vec<String>) {
        for url in urls {
            let photo = ItemPhoto::new(item_id, url);
            self.photos.insert(photo.id, photo);
        }
    }

    fn remove_photos(&mut self, item_id: Uuid, photo_ids: &[Uuid]) -> u64 {
        let mut removed = 0;
        for id in photo_ids {
            if self.photos.get(id).is_some_and(|p| p.item_id == item_id) {
                self.photos.remove(id);
                removed += 1;
            }
        }
        removed
    }

    /// Recount and rewrite the flag; returns the count.
    fn sync_has_photos(&mut self, item_id: Uuid) -> u64 {
        let count = self.photo_count(item_id);
        if let Some(item) = self.items.get_mut(&item_id) {
            item.has_photos = count > 0;
            item.updated_at = chrono::Utc::now();
        }
        count
    }
}

/// In-memory implementation for tests and local development.
///
/// Each mutation runs under a single write guard, so the photo set and the
/// flag are never observed out of step.
#[derive(Debug, Default, Clone)]
pub struct InMemoryItemRepository {
    store: Arc<RwLock<Store>>,
    categories: Option<InMemoryCategoryRepository>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and check `category_id` against a category store.
    pub fn with_categories(mut self, categories: InMemoryCategoryRepository) -> Self {
        self.categories = Some(categories);
        self
    }

    /// `None` when no category store is attached or the category is gone.
    async fn resolve_category(&self, category_id: Option<Uuid>) -> ItemResult<Option<Category>> {
        match (&self.categories, category_id) {
            (Some(categories), Some(id)) => categories
                .get_by_id(id)
                .await
                .map_err(|e| ItemError::Database(e.to_string())),
            _ => Ok(None),
        }
    }

    async fn ensure_category(&self, category_id: Option<Uuid>) -> ItemResult<()> {
        let (Some(categories), Some(id)) = (&self.categories, category_id) else {
            return Ok(());
        };
        match categories.get_by_id(id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ItemError::CategoryNotFound(id)),
            Err(e) => Err(ItemError::Database(e.to_string())),
        }
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, input: CreateItem) -> ItemResult<Item> {
        self.ensure_category(input.category_id).await?;

        let item = Item::new(&input);
        let mut store = self.store.write().await;
        store.items.insert(item.id, item.clone());
        store.insert_photos(item.id, input.photos);

        tracing::info!(item_id = %item.id, "Created item");
        Ok(item)
    }

    async fn get_by_id(&self, id: Uuid) -> ItemResult<Option<Item>> {
        let store = self.store.read().await;
        Ok(store.items.get(&id).cloned())
    }

    async fn get_details(&self, id: Uuid) -> ItemResult<Option<ItemDetails>> {
        let (item, photos) = {
            let store = self.store.read().await;
            let Some(item) = store.items.get(&id).cloned() else {
                return Ok(None);
            };
            let photos = store.photos_of(id);
            (item, photos)
        };

        let category = self.resolve_category(item.category_id).await?;

        Ok(Some(ItemDetails {
            item,
            photos,
            category,
        }))
    }

    async fn list(&self, filter: ItemFilter) -> ItemResult<Vec<ItemSummary>> {
        let page = {
            let store = self.store.read().await;
            let mut items: Vec<Item> = store
                .items
                .values()
                .filter(|item| filter.matches(item))
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Page::new(filter.limit, filter.offset).slice(items)
        };

        let mut summaries = Vec::with_capacity(page.len());
        for item in page {
            let category = self.resolve_category(item.category_id).await?;
            summaries.push(ItemSummary { item, category });
        }
        Ok(summaries)
    }

    async fn update(&self, id: Uuid, input: UpdateItem) -> ItemResult<Item> {
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let mut store = self.store.write().await;

        let mut item = store.items.get(&id).cloned().ok_or(ItemError::NotFound(id))?;
        item.apply_update(&input);
        item.validate()?;
        store.items.insert(id, item);

        if input.touches_photos() {
            store.remove_photos(id, &input.photo_ids_to_delete);
            store.insert_photos(id, input.photos_to_add);
            store.sync_has_photos(id);
        }

        tracing::info!(item_id = %id, "Updated item");
        store.items.get(&id).cloned().ok_or(ItemError::NotFound(id))
    }

    async fn delete(&self, id: Uuid) -> ItemResult<bool> {
        let mut store = self.store.write().await;
        if store.items.remove(&id).is_none() {
            return Ok(false);
        }
        store.photos.retain(|_, photo| photo.item_id != id);

        tracing::info!(item_id = %id, "Deleted item");
        Ok(true)
    }

    async fn list_photos(&self, item_id: Uuid) -> ItemResult<Vec<ItemPhoto>> {
        let store = self.store.read().await;
        if !store.items.contains_key(&item_id) {
            return Err(ItemError::NotFound(item_id));
        }
        Ok(store.photos_of(item_id))
    }

    async fn add_photos(&self, item_id: Uuid, urls: Vec<String>) -> ItemResult<u64> {
        let mut store = self.store.write().await;
        if !store.items.contains_key(&item_id) {
            return Err(ItemError::NotFound(item_id));
        }
        if urls.is_empty() {
            return Ok(store.photo_count(item_id));
        }

        let added = urls.len();
        store.insert_photos(item_id, urls);
        let count = store.sync_has_photos(item_id);

        tracing::info!(item_id = %item_id, added, count, "Added item photos");
        Ok(count)
    }

    async fn delete_photos(&self, item_id: Uuid, photo_ids: Vec<Uuid>) -> ItemResult<u64> {
        let mut store = self.store.write().await;
        if !store.items.contains_key(&item_id) {
            return Err(ItemError::NotFound(item_id));
        }
        if photo_ids.is_empty() {
            return Ok(0);
        }

        let removed = store.remove_photos(item_id, &photo_ids);
        let count = store.sync_has_photos(item_id);

        tracing::info!(item_id = %item_id, removed, count, "Deleted item photos");
        Ok(removed)
    }

    async fn count_photos(&self, item_id: Uuid) -> ItemResult<u64> {
        let store = self.store.read().await;
        if !store.items.contains_key(&item_id) {
            return Err(ItemError::NotFound(item_id));
        }
        Ok(store.photo_count(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_categories::CreateCategory;
    use std::time::Duration;

    fn create_item(price: i64) -> CreateItem {
        CreateItem {
            title: format!("Item priced {}", price),
            description: "Well kept and ready to rent".to_string(),
            price,
            location: "Lisbon".to_string(),
            author_id: Uuid::now_v7(),
            category_id: None,
            tags: vec![],
            photos: vec![],
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://cdn.example.com/{}.jpg", i))
            .collect()
    }

    #[tokio::test]
    async fn test_photo_flag_follows_add_and_delete() {
        let repo = InMemoryItemRepository::new();
        let item = repo.create(create_item(10)).await.unwrap();
        assert!(!item.has_photos);

        assert_eq!(repo.add_photos(item.id, urls(2)).await.unwrap(), 2);
        assert!(repo.get_by_id(item.id).await.unwrap().unwrap().has_photos);

        let ids: Vec<Uuid> = repo
            .list_photos(item.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(repo.delete_photos(item.id, ids.clone()).await.unwrap(), 2);
        assert_eq!(repo.count_photos(item.id).await.unwrap(), 0);
        assert!(!repo.get_by_id(item.id).await.unwrap().unwrap().has_photos);

        // Second delete of the same ids is a no-op
        assert_eq!(repo.delete_photos(item.id, ids).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_with_photos_sets_flag() {
        let repo = InMemoryItemRepository::new();
        let mut input = create_item(10);
        input.photos = urls(3);

        let item = repo.create(input).await.unwrap();
        assert!(item.has_photos);
        assert_eq!(repo.count_photos(item.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_photos_skips_foreign_ids() {
        let repo = InMemoryItemRepository::new();
        let first = repo.create(create_item(10)).await.unwrap();
        let second = repo.create(create_item(20)).await.unwrap();
        repo.add_photos(second.id, urls(1)).await.unwrap();

        let foreign = repo.list_photos(second.id).await.unwrap()[0].id;
        assert_eq!(repo.delete_photos(first.id, vec![foreign]).await.unwrap(), 0);
        assert_eq!(repo.count_photos(second.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_photo_operations_on_missing_item() {
        let repo = InMemoryItemRepository::new();
        let missing = Uuid::now_v7();

        assert!(matches!(
            repo.add_photos(missing, vec![]).await,
            Err(ItemError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_photos(missing, vec![]).await,
            Err(ItemError::NotFound(_))
        ));
        assert!(matches!(
            repo.count_photos(missing).await,
            Err(ItemError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_applies_fields_and_photos_together() {
        let repo = InMemoryItemRepository::new();
        let mut input = create_item(10);
        input.photos = urls(1);
        let item = repo.create(input).await.unwrap();
        let old_photo = repo.list_photos(item.id).await.unwrap()[0].id;

        let updated = repo
            .update(
                item.id,
                UpdateItem {
                    price: Some(99),
                    photos_to_add: urls(2),
                    photo_ids_to_delete: vec![old_photo],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, 99);
        assert!(updated.has_photos);
        assert_eq!(repo.count_photos(item.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_removing_last_photo_clears_flag() {
        let repo = InMemoryItemRepository::new();
        let mut input = create_item(10);
        input.photos = urls(1);
        let item = repo.create(input).await.unwrap();
        let photo = repo.list_photos(item.id).await.unwrap()[0].id;

        let updated = repo
            .update(
                item.id,
                UpdateItem {
                    photo_ids_to_delete: vec![photo],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.has_photos);
    }

    #[tokio::test]
    async fn test_list_price_range_newest_first() {
        let repo = InMemoryItemRepository::new();
        for price in [5, 10, 25, 50, 75] {
            repo.create(create_item(price)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let items = repo
            .list(ItemFilter {
                min_price: Some(10),
                max_price: Some(50),
                limit: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();

        let prices: Vec<i64> = items.iter().map(|i| i.item.price).collect();
        assert_eq!(prices, [50, 25, 10]);
    }

    #[tokio::test]
    async fn test_empty_filter_uses_default_page() {
        let repo = InMemoryItemRepository::new();
        for price in 0..25 {
            repo.create(create_item(price)).await.unwrap();
        }

        let items = repo.list(ItemFilter::default()).await.unwrap();
        assert_eq!(items.len(), 20);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected_when_categories_attached() {
        let categories = InMemoryCategoryRepository::new();
        let repo = InMemoryItemRepository::new().with_categories(categories.clone());

        let mut input = create_item(10);
        input.category_id = Some(Uuid::now_v7());
        assert!(matches!(
            repo.create(input).await,
            Err(ItemError::CategoryNotFound(_))
        ));

        let category = categories
            .create(CreateCategory {
                name: "Tools".into(),
            })
            .await
            .unwrap();
        let mut input = create_item(10);
        input.category_id = Some(category.id);
        let item = repo.create(input).await.unwrap();

        let details = repo.get_details(item.id).await.unwrap().unwrap();
        assert_eq!(details.category.map(|c| c.name), Some("Tools".to_string()));

        let listed = repo.list(ItemFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].item.id, item.id);
        assert_eq!(
            listed[0].category.as_ref().map(|c| c.name.as_str()),
            Some("Tools")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_photos() {
        let repo = InMemoryItemRepository::new();
        let mut input = create_item(10);
        input.photos = urls(2);
        let item = repo.create(input).await.unwrap();

        assert!(repo.delete(item.id).await.unwrap());
        assert!(!repo.delete(item.id).await.unwrap());
        assert!(repo.get_details(item.id).await.unwrap().is_none());
    }
}
