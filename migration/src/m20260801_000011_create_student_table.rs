use sea_orm_migration::prelude::*;

/// Creates the `student` profile table, optionally linked to a parent.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Student {
    Table,
    Id,
    UserId,
    ParentId,
    FullName,
    DateOfBirth,
    Gender,
    Grade,
    School,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Parent {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Student::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Student::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Student::ParentId).uuid().null())
                    .col(ColumnDef::new(Student::FullName).string_len(100).not_null())
                    .col(ColumnDef::new(Student::DateOfBirth).date().null())
                    .col(ColumnDef::new(Student::Gender).string_len(10).null())
                    .col(ColumnDef::new(Student::Grade).string_len(50).null())
                    .col(ColumnDef::new(Student::School).string_len(255).null())
                    .col(
                        ColumnDef::new(Student::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Student::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_user_id")
                            .from(Student::Table, Student::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_parent_id")
                            .from(Student::Table, Student::ParentId)
                            .to(Parent::Table, Parent::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}
