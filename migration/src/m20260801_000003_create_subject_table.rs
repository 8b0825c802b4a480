use sea_orm_migration::prelude::*;

/// Creates the `subject` catalog table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Subject {
    Table,
    Id,
    Code,
    Name,
    Description,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subject::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subject::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Subject::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Subject::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Subject::Description).string_len(500).null())
                    .col(
                        ColumnDef::new(Subject::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subject::Table).to_owned())
            .await
    }
}
