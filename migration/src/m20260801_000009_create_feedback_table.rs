use sea_orm_migration::prelude::*;

/// Creates the `feedback` table with a unique (tutor, author) pair.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Feedback {
    Table,
    Id,
    TutorId,
    AuthorUserId,
    AuthorRole,
    Rating,
    Comment,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tutor {
    Table,
    Id,
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
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Feedback::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Feedback::TutorId).uuid().not_null())
                    .col(ColumnDef::new(Feedback::AuthorUserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Feedback::AuthorRole)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Feedback::Rating).integer().not_null())
                    .col(ColumnDef::new(Feedback::Comment).string_len(2000).null())
                    .col(
                        ColumnDef::new(Feedback::Status)
                            .string_len(20)
                            .not_null()
                            .default("visible"),
                    )
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Feedback::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_tutor_id")
                            .from(Feedback::Table, Feedback::TutorId)
                            .to(Tutor::Table, Tutor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_author_user_id")
                            .from(Feedback::Table, Feedback::AuthorUserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One feedback per (tutor, author) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_tutor_author")
                    .table(Feedback::Table)
                    .col(Feedback::TutorId)
                    .col(Feedback::AuthorUserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}
