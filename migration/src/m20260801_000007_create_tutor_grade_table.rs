use sea_orm_migration::prelude::*;

/// Creates the `tutor_grade` join table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TutorGrade::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TutorGrade::TutorId).uuid().not_null())
                    .col(ColumnDef::new(TutorGrade::GradeId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(TutorGrade::TutorId)
                            .col(TutorGrade::GradeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutor_grade_tutor_id")
                            .from(TutorGrade::Table, TutorGrade::TutorId)
                            .to(Tutor::Table, Tutor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutor_grade_grade_id")
                            .from(TutorGrade::Table, TutorGrade::GradeId)
                            .to(Grade::Table, Grade::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Reverse lookup for grade-filtered search
        manager
            .create_index(
                Index::create()
                    .name("idx_tutor_grade_grade_id")
                    .table(TutorGrade::Table)
                    .col(TutorGrade::GradeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TutorGrade::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TutorGrade {
    Table,
    TutorId,
    GradeId,
}

#[derive(DeriveIden)]
enum Tutor {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Grade {
    Table,
    Id,
}
