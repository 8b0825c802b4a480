use sea_orm_migration::prelude::*;

/// Creates the `tutor` table holding the onboarding profile and the
/// denormalized rating aggregate.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tutor {
    Table,
    Id,
    UserId,
    FullName,
    AvatarUrl,
    Gender,
    DateOfBirth,
    PlaceOfBirth,
    Address,
    TeachingArea,
    Bio,
    IdentityNumber,
    HourlyRate,
    ProfileStatus,
    CurrentStep,
    CompletedSteps,
    IsProfileComplete,
    AverageRating,
    TotalFeedback,
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
                    .table(Tutor::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tutor::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tutor::UserId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Tutor::FullName).string_len(100).not_null())
                    .col(ColumnDef::new(Tutor::AvatarUrl).string_len(500).null())
                    .col(ColumnDef::new(Tutor::Gender).string_len(10).not_null())
                    .col(ColumnDef::new(Tutor::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Tutor::PlaceOfBirth).string_len(100).null())
                    .col(ColumnDef::new(Tutor::Address).string_len(255).null())
                    .col(ColumnDef::new(Tutor::TeachingArea).string_len(255).null())
                    .col(ColumnDef::new(Tutor::Bio).string_len(2000).null())
                    .col(ColumnDef::new(Tutor::IdentityNumber).string_len(30).null())
                    .col(ColumnDef::new(Tutor::HourlyRate).double().not_null())
                    .col(
                        ColumnDef::new(Tutor::ProfileStatus)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Tutor::CurrentStep)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Tutor::CompletedSteps).json_binary().not_null())
                    .col(
                        ColumnDef::new(Tutor::IsProfileComplete)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tutor::AverageRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Tutor::TotalFeedback)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tutor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tutor::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutor_user_id")
                            .from(Tutor::Table, Tutor::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Search path: approved + complete, ordered by rating
        manager
            .create_index(
                Index::create()
                    .name("idx_tutor_profile_status")
                    .table(Tutor::Table)
                    .col(Tutor::ProfileStatus)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tutor::Table).to_owned())
            .await
    }
}
