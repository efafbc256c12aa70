//! PostgreSQL item repository.
//!
//! Photo mutations follow one protocol inside [`with_transaction`]: lock the
//! item row, change the photo rows, `SELECT count(*)`, write `has_photos`.
//! The row lock serialises concurrent photo writes for the same item.

use async_trait::async_trait;
use chrono::Utc;
use database::{BaseRepository, Page, contains_ci, with_transaction};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::{item, item_photo},
    error::{ItemError, ItemResult},
    models::{CreateItem, Item, ItemDetails, ItemFilter, ItemPhoto, ItemSummary, UpdateItem},
    repository::ItemRepository,
};

pub struct PgItemRepository {
    base: BaseRepository<item::Entity>,
}

impl PgItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

/// Conjunction of the filter's predicates; absent fields add nothing.
pub fn build_condition(filter: &ItemFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(min_price) = filter.min_price {
        condition = condition.add(item::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        condition = condition.add(item::Column::Price.lte(max_price));
    }
    if let Some(location) = filter.location.as_deref() {
        condition = condition.add(contains_ci(item::Column::Location, location));
    }
    if let Some(search) = filter.search.as_deref() {
        condition = condition.add(
            Condition::any()
                .add(contains_ci(item::Column::Title, search))
                .add(contains_ci(item::Column::Description, search)),
        );
    }
    if let Some(category_id) = filter.category_id {
        condition = condition.add(item::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = filter.author_id {
        condition = condition.add(item::Column::AuthorId.eq(author_id));
    }

    condition
}

/// `SELECT … FOR UPDATE` on the item row.
async fn lock_item(txn: &DatabaseTransaction, id: Uuid) -> ItemResult<item::Model> {
    item::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(ItemError::NotFound(id))
}

async fn insert_photos<C: ConnectionTrait>(
    db: &C,
    item_id: Uuid,
    urls: Vec<String>,
) -> ItemResult<()> {
    if urls.is_empty() {
        return Ok(());
    }

    let rows: Vec<item_photo::ActiveModel> = urls
        .into_iter()
        .map(|url| ItemPhoto::new(item_id, url).into())
        .collect();
    item_photo::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn delete_photos_of<C: ConnectionTrait>(
    db: &C,
    item_id: Uuid,
    photo_ids: Vec<Uuid>,
) -> ItemResult<u64> {
    if photo_ids.is_empty() {
        return Ok(0);
    }

    let result = item_photo::Entity::delete_many()
        .filter(item_photo::Column::ItemId.eq(item_id))
        .filter(item_photo::Column::Id.is_in(photo_ids))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn photo_count<C: ConnectionTrait>(db: &C, item_id: Uuid) -> ItemResult<u64> {
    let count = item_photo::Entity::find()
        .filter(item_photo::Column::ItemId.eq(item_id))
        .count(db)
        .await?;
    Ok(count)
}

/// Recount the photos and store `has_photos = count > 0`; returns the count.
async fn sync_has_photos(txn: &DatabaseTransaction, item_id: Uuid) -> ItemResult<u64> {
    let count = photo_count(txn, item_id).await?;

    item::Entity::update_many()
        .col_expr(item::Column::HasPhotos, Expr::value(count > 0))
        .col_expr(item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(item::Column::Id.eq(item_id))
        .exec(txn)
        .await?;

    tracing::debug!(item_id = %item_id, count, "Synced has_photos");
    Ok(count)
}

async fn create_in(txn: &DatabaseTransaction, input: CreateItem) -> ItemResult<Item> {
    let item = Item::new(&input);
    let category_id = item.category_id;
    let item_id = item.id;

    let model = item::ActiveModel::from(item)
        .insert(txn)
        .await
        .map_err(|e| ItemError::from_item_write(e, category_id))?;

    insert_photos(txn, item_id, input.photos).await?;
    model.try_into()
}

async fn update_in(txn: &DatabaseTransaction, id: Uuid, input: UpdateItem) -> ItemResult<Item> {
    let mut item = Item::try_from(lock_item(txn, id).await?)?;
    item.apply_update(&input);
    item.validate()?;

    let category_id = item.category_id;
    let model = item::ActiveModel::from(item)
        .update(txn)
        .await
        .map_err(|e| ItemError::from_item_write(e, category_id))?;

    if !input.touches_photos() {
        return model.try_into();
    }

    delete_photos_of(txn, id, input.photo_ids_to_delete).await?;
    insert_photos(txn, id, input.photos_to_add).await?;
    sync_has_photos(txn, id).await?;

    let refreshed = item::Entity::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(ItemError::NotFound(id))?;
    refreshed.try_into()
}

async fn add_photos_in(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    urls: Vec<String>,
) -> ItemResult<u64> {
    lock_item(txn, item_id).await?;
    insert_photos(txn, item_id, urls).await?;
    sync_has_photos(txn, item_id).await
}

async fn delete_photos_in(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    photo_ids: Vec<Uuid>,
) -> ItemResult<u64> {
    lock_item(txn, item_id).await?;
    let removed = delete_photos_of(txn, item_id, photo_ids).await?;
    sync_has_photos(txn, item_id).await?;
    Ok(removed)
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn create(&self, input: CreateItem) -> ItemResult<Item> {
        let photos = input.photos.len();
        let item = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { create_in(txn, input).await })
        })
        .await?;

        tracing::info!(item_id = %item.id, photos, "Created item");
        Ok(item)
    }

    async fn get_by_id(&self, id: Uuid) -> ItemResult<Option<Item>> {
        let model = self.base.find_by_id(id).await?;
        model.map(Item::try_from).transpose()
    }

    async fn get_details(&self, id: Uuid) -> ItemResult<Option<ItemDetails>> {
        let Some(model) = self.base.find_by_id(id).await? else {
            return Ok(None);
        };

        let photos = self.list_photos_unchecked(id).await?;

        let category = match model.category_id {
            Some(category_id) => domain_categories::entity::Entity::find_by_id(category_id)
                .one(self.base.db())
                .await?
                .map(Into::into),
            None => None,
        };

        Ok(Some(ItemDetails {
            item: model.try_into()?,
            photos,
            category,
        }))
    }

    async fn list(&self, filter: ItemFilter) -> ItemResult<Vec<ItemSummary>> {
        let query = item::Entity::find()
            .find_also_related(domain_categories::entity::Entity)
            .filter(build_condition(&filter))
            .order_by_desc(item::Column::CreatedAt)
            .order_by_desc(item::Column::Id);

        let rows = Page::new(filter.limit, filter.offset)
            .apply(query)
            .all(self.base.db())
            .await?;

        rows.into_iter()
            .map(|(model, category)| {
                Ok(ItemSummary {
                    item: model.try_into()?,
                    category: category.map(Into::into),
                })
            })
            .collect()
    }

    async fn update(&self, id: Uuid, input: UpdateItem) -> ItemResult<Item> {
        let item = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { update_in(txn, id, input).await })
        })
        .await?;

        tracing::info!(item_id = %id, "Updated item");
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> ItemResult<bool> {
        let rows = self
            .base
            .delete_by_id(id)
            .await
            .map_err(|e| ItemError::from_item_delete(e, id))?;

        if rows > 0 {
            tracing::info!(item_id = %id, "Deleted item");
        }
        Ok(rows > 0)
    }

    async fn list_photos(&self, item_id: Uuid) -> ItemResult<Vec<ItemPhoto>> {
        self.ensure_exists(item_id).await?;
        self.list_photos_unchecked(item_id).await
    }

    async fn add_photos(&self, item_id: Uuid, urls: Vec<String>) -> ItemResult<u64> {
        if urls.is_empty() {
            self.ensure_exists(item_id).await?;
            return photo_count(self.base.db(), item_id).await;
        }

        let added = urls.len();
        let count = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { add_photos_in(txn, item_id, urls).await })
        })
        .await?;

        tracing::info!(item_id = %item_id, added, count, "Added item photos");
        Ok(count)
    }

    async fn delete_photos(&self, item_id: Uuid, photo_ids: Vec<Uuid>) -> ItemResult<u64> {
        if photo_ids.is_empty() {
            self.ensure_exists(item_id).await?;
            return Ok(0);
        }

        let removed = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { delete_photos_in(txn, item_id, photo_ids).await })
        })
        .await?;

        tracing::info!(item_id = %item_id, removed, "Deleted item photos");
        Ok(removed)
    }

    async fn count_photos(&self, item_id: Uuid) -> ItemResult<u64> {
        self.ensure_exists(item_id).await?;
        photo_count(self.base.db(), item_id).await
    }
}

impl PgItemRepository {
    async fn ensure_exists(&self, id: Uuid) -> ItemResult<()> {
        match self.base.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ItemError::NotFound(id)),
        }
    }

    async fn list_photos_unchecked(&self, item_id: Uuid) -> ItemResult<Vec<ItemPhoto>> {
        let models = item_photo::Entity::find()
            .filter(item_photo::Column::ItemId.eq(item_id))
            .order_by_asc(item_photo::Column::CreatedAt)
            .order_by_asc(item_photo::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
