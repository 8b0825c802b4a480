use sea_orm_migration::prelude::*;

/// Creates the `certificate` table; images are stored as a JSON URL array.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Certificate {
    Table,
    Id,
    TutorId,
    SchoolName,
    Major,
    EducationStatus,
    Images,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tutor {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificate::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Certificate::TutorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Certificate::SchoolName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificate::Major).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Certificate::EducationStatus)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificate::Images).json_binary().not_null())
                    .col(
                        ColumnDef::new(Certificate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificate::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_tutor_id")
                            .from(Certificate::Table, Certificate::TutorId)
                            .to(Tutor::Table, Tutor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_tutor_id")
                    .table(Certificate::Table)
                    .col(Certificate::TutorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}
