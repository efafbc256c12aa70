use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000002_create_items::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemPhotos::Table)
                    .if_not_exists()
                    .col(pk_uuid(ItemPhotos::Id))
                    .col(uuid(ItemPhotos::ItemId))
                    .col(string_len(ItemPhotos::Url, 2048))
                    .col(
                        timestamp_with_time_zone(ItemPhotos::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(ItemPhotos::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_photos_item_id")
                            .from(ItemPhotos::Table, ItemPhotos::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_photos_item_id")
                    .table(ItemPhotos::Table)
                    .col(ItemPhotos::ItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER item_photos_touch_updated_at
                    BEFORE UPDATE ON item_photos
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS item_photos_touch_updated_at ON item_photos")
            .await?;

        manager
            .drop_table(Table::drop().table(ItemPhotos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ItemPhotos {
    Table,
    Id,
    ItemId,
    Url,
    CreatedAt,
    UpdatedAt,
}
