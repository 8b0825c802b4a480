use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Convert a UUID string (with dashes) to an `SQLite` hex-blob literal.
fn uuid_blob(uuid_str: &str) -> String {
    let hex: String = uuid_str.chars().filter(|c| *c != '-').collect();
    format!("X'{hex}'")
}

/// A single grade definition.
struct Grade {
    id: &'static str,
    code: &'static str,
    name: &'static str,
    order_number: i32,
}

#[rustfmt::skip]
const GRADES: &[Grade] = &[
    Grade { id: "02000000-0000-4000-8000-000000000001", code: "grade_1",  name: "Grade 1",  order_number: 1 },
    Grade { id: "02000000-0000-4000-8000-000000000002", code: "grade_2",  name: "Grade 2",  order_number: 2 },
    Grade { id: "02000000-0000-4000-8000-000000000003", code: "grade_3",  name: "Grade 3",  order_number: 3 },
    Grade { id: "02000000-0000-4000-8000-000000000004", code: "grade_4",  name: "Grade 4",  order_number: 4 },
    Grade { id: "02000000-0000-4000-8000-000000000005", code: "grade_5",  name: "Grade 5",  order_number: 5 },
    Grade { id: "02000000-0000-4000-8000-000000000006", code: "grade_6",  name: "Grade 6",  order_number: 6 },
    Grade { id: "02000000-0000-4000-8000-000000000007", code: "grade_7",  name: "Grade 7",  order_number: 7 },
    Grade { id: "02000000-0000-4000-8000-000000000008", code: "grade_8",  name: "Grade 8",  order_number: 8 },
    Grade { id: "02000000-0000-4000-8000-000000000009", code: "grade_9",  name: "Grade 9",  order_number: 9 },
    Grade { id: "02000000-0000-4000-8000-000000000010", code: "grade_10", name: "Grade 10", order_number: 10 },
    Grade { id: "02000000-0000-4000-8000-000000000011", code: "grade_11", name: "Grade 11", order_number: 11 },
    Grade { id: "02000000-0000-4000-8000-000000000012", code: "grade_12", name: "Grade 12", order_number: 12 },
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = manager.get_database_backend();

        for grade in GRADES {
            let sql = if backend == sea_orm::DatabaseBackend::Postgres {
                format!(
                    "INSERT INTO grade (id, code, name, order_number, status) \
                     VALUES ('{id}', '{code}', '{name}', {order}, 'active') \
                     ON CONFLICT (id) DO NOTHING",
                    id = grade.id,
                    code = grade.code,
                    name = grade.name,
                    order = grade.order_number,
                )
            } else {
                let id_blob = uuid_blob(grade.id);
                format!(
                    "INSERT OR IGNORE INTO grade (id, code, name, order_number, status) \
                     VALUES ({id_blob}, '{code}', '{name}', {order}, 'active')",
                    id_blob = id_blob,
                    code = grade.code,
                    name = grade.name,
                    order = grade.order_number,
                )
            };
            db.execute(sea_orm::Statement::from_string(backend, sql))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(GradeIden::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GradeIden {
    #[sea_orm(iden = "grade")]
    Table,
}
