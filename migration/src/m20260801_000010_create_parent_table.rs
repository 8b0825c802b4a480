use sea_orm_migration::prelude::*;

/// Creates the `parent` profile table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Parent {
    Table,
    Id,
    UserId,
    FullName,
    AvatarUrl,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parent::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parent::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Parent::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Parent::FullName).string_len(100).not_null())
                    .col(ColumnDef::new(Parent::AvatarUrl).string_len(500).null())
                    .col(ColumnDef::new(Parent::Address).string_len(255).null())
                    .col(
                        ColumnDef::new(Parent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parent::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parent_user_id")
                            .from(Parent::Table, Parent::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parent::Table).to_owned())
            .await
    }
}
