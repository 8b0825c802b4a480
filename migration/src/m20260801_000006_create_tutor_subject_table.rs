use sea_orm_migration::prelude::*;

/// Creates the `tutor_subject` join table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TutorSubject::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TutorSubject::TutorId).uuid().not_null())
                    .col(ColumnDef::new(TutorSubject::SubjectId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(TutorSubject::TutorId)
                            .col(TutorSubject::SubjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutor_subject_tutor_id")
                            .from(TutorSubject::Table, TutorSubject::TutorId)
                            .to(Tutor::Table, Tutor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutor_subject_subject_id")
                            .from(TutorSubject::Table, TutorSubject::SubjectId)
                            .to(Subject::Table, Subject::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Reverse lookup for subject-filtered search
        manager
            .create_index(
                Index::create()
                    .name("idx_tutor_subject_subject_id")
                    .table(TutorSubject::Table)
                    .col(TutorSubject::SubjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TutorSubject::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TutorSubject {
    Table,
    TutorId,
    SubjectId,
}

#[derive(DeriveIden)]
enum Tutor {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Subject {
    Table,
    Id,
}
