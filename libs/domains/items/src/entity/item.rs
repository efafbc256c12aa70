use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ItemError;
use crate::models::Item;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: i64,
    pub location: String,
    pub has_photos: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub tags: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_photo::Entity")]
    Photos,
    #[sea_orm(
        belongs_to = "domain_categories::entity::Entity",
        from = "Column::CategoryId",
        to = "domain_categories::entity::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::item_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<domain_categories::entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fails when the stored `tags` column is not an array of strings.
impl TryFrom<Model> for Item {
    type Error = ItemError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_value(model.tags).map_err(|e| {
            ItemError::Database(format!("item {} has malformed tags: {}", model.id, e))
        })?;

        Ok(Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            location: model.location,
            has_photos: model.has_photos,
            author_id: model.author_id,
            category_id: model.category_id,
            tags,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Item> for ActiveModel {
    fn from(item: Item) -> Self {
        ActiveModel {
            id: Set(item.id),
            title: Set(item.title),
            description: Set(item.description),
            price: Set(item.price),
            location: Set(item.location),
            has_photos: Set(item.has_photos),
            author_id: Set(item.author_id),
            category_id: Set(item.category_id),
            tags: Set(Json::from(item.tags)),
            created_at: Set(item.created_at.into()),
            updated_at: Set(item.updated_at.into()),
        }
    }
}
