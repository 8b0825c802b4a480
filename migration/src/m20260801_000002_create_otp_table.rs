use sea_orm_migration::prelude::*;

/// Creates the `otp` table: short-lived verification codes keyed by
/// (email, purpose), with the staged registration payload as JSON.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Otp {
    Table,
    Id,
    Email,
    Code,
    Purpose,
    ExpiresAt,
    Verified,
    Attempts,
    StagedPayload,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Otp::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Otp::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Otp::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Otp::Code).string_len(10).not_null())
                    .col(ColumnDef::new(Otp::Purpose).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Otp::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Otp::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Otp::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Otp::StagedPayload).json_binary().null())
                    .col(
                        ColumnDef::new(Otp::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Otp::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otp_email_purpose")
                    .table(Otp::Table)
                    .col(Otp::Email)
                    .col(Otp::Purpose)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Otp::Table).to_owned())
            .await
    }
}
