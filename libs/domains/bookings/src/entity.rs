use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Booking, BookingStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "domain_items::entity::item::Entity",
        from = "Column::ItemId",
        to = "domain_items::entity::item::Column::Id",
        on_delete = "Restrict"
    )]
    Item,
}

impl Related<domain_items::entity::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Booking {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            user_id: model.user_id,
            start_date: model.start_date.into(),
            end_date: model.end_date.into(),
            price: model.price,
            status: model.status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Booking> for ActiveModel {
    fn from(booking: Booking) -> Self {
        ActiveModel {
            id: Set(booking.id),
            item_id: Set(booking.item_id),
            user_id: Set(booking.user_id),
            start_date: Set(booking.start_date.into()),
            end_date: Set(booking.end_date.into()),
            price: Set(booking.price),
            status: Set(booking.status),
            created_at: Set(booking.created_at.into()),
            updated_at: Set(booking.updated_at.into()),
        }
    }
}
