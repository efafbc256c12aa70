//! SeaORM entities for `items` and `item_photos`.

pub mod item;
pub mod item_photo;
