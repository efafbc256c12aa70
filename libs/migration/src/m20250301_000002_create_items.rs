use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(pk_uuid(Items::Id))
                    .col(string_len(Items::Title, 200))
                    .col(text(Items::Description))
                    .col(big_integer(Items::Price))
                    .col(string_len(Items::Location, 500))
                    .col(boolean(Items::HasPhotos).default(false))
                    .col(uuid(Items::AuthorId))
                    .col(uuid_null(Items::CategoryId))
                    .col(json(Items::Tags).default("[]"))
                    .col(
                        timestamp_with_time_zone(Items::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Items::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_category_id")
                            .from(Items::Table, Items::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_items_created_at", Items::CreatedAt),
            ("idx_items_price", Items::Price),
            ("idx_items_category_id", Items::CategoryId),
            ("idx_items_author_id", Items::AuthorId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Items::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE items ADD CONSTRAINT chk_items_price_non_negative CHECK (price >= 0)",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER items_touch_updated_at
                    BEFORE UPDATE ON items
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
            .execute_unprepared("DROP TRIGGER IF EXISTS items_touch_updated_at ON items")
            .await?;

        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Items {
    Table,
    Id,
    Title,
    Description,
    Price,
    Location,
    HasPhotos,
    AuthorId,
    CategoryId,
    Tags,
    CreatedAt,
    UpdatedAt,
}
