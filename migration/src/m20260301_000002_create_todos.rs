use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Todos::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Todos::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Todos::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Todos::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Todos::Status)
                            .string_len(50)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Todos::ImageId).string_len(255).null())
                    .col(
                        ColumnDef::new(Todos::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Todos::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-todos-user_id")
                            .from(Todos::Table, Todos::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-todos-user_id-created_at")
                    .table(Todos::Table)
                    .col(Todos::UserId)
                    .col(Todos::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // One todo per image: an image reference is never shared.
        manager
            .create_index(
                Index::create()
                    .name("idx-todos-image_id")
                    .table(Todos::Table)
                    .col(Todos::ImageId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Todos {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Status,
    ImageId,
    CreatedAt,
    UpdatedAt,
}
