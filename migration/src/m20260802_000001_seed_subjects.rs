use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Convert a UUID string (with dashes) to an `SQLite` hex-blob literal.
///
/// `SeaORM` stores UUID columns as 16-byte BLOBs in `SQLite`, so raw SQL
/// inserts must use `X'...'` notation to match the format.
fn uuid_blob(uuid_str: &str) -> String {
    let hex: String = uuid_str.chars().filter(|c| *c != '-').collect();
    format!("X'{hex}'")
}

/// A single subject definition.
struct Subject {
    id: &'static str,
    code: &'static str,
    name: &'static str,
}

#[rustfmt::skip]
const SUBJECTS: &[Subject] = &[
    Subject { id: "01000000-0000-4000-8000-000000000001", code: "math",       name: "Mathematics" },
    Subject { id: "01000000-0000-4000-8000-000000000002", code: "physics",    name: "Physics" },
    Subject { id: "01000000-0000-4000-8000-000000000003", code: "chemistry",  name: "Chemistry" },
    Subject { id: "01000000-0000-4000-8000-000000000004", code: "biology",    name: "Biology" },
    Subject { id: "01000000-0000-4000-8000-000000000005", code: "literature", name: "Literature" },
    Subject { id: "01000000-0000-4000-8000-000000000006", code: "english",    name: "English" },
    Subject { id: "01000000-0000-4000-8000-000000000007", code: "history",    name: "History" },
    Subject { id: "01000000-0000-4000-8000-000000000008", code: "geography",  name: "Geography" },
    Subject { id: "01000000-0000-4000-8000-000000000009", code: "informatics", name: "Informatics" },
    Subject { id: "01000000-0000-4000-8000-000000000010", code: "civics",     name: "Civic Education" },
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = manager.get_database_backend();

        for subject in SUBJECTS {
            let sql = if backend == sea_orm::DatabaseBackend::Postgres {
                format!(
                    "INSERT INTO subject (id, code, name, status) \
                     VALUES ('{id}', '{code}', '{name}', 'active') \
                     ON CONFLICT (id) DO NOTHING",
                    id = subject.id,
                    code = subject.code,
                    name = subject.name,
                )
            } else {
                let id_blob = uuid_blob(subject.id);
                format!(
                    "INSERT OR IGNORE INTO subject (id, code, name, status) \
                     VALUES ({id_blob}, '{code}', '{name}', 'active')",
                    id_blob = id_blob,
                    code = subject.code,
                    name = subject.name,
                )
            };
            db.execute(sea_orm::Statement::from_string(backend, sql))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(SubjectIden::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SubjectIden {
    #[sea_orm(iden = "subject")]
    Table,
}
