pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_user_table;
mod m20260801_000002_create_otp_table;
mod m20260801_000003_create_subject_table;
mod m20260801_000004_create_grade_table;
mod m20260801_000005_create_tutor_table;
mod m20260801_000006_create_tutor_subject_table;
mod m20260801_000007_create_tutor_grade_table;
mod m20260801_000008_create_certificate_table;
mod m20260801_000009_create_feedback_table;
mod m20260801_000010_create_parent_table;
mod m20260801_000011_create_student_table;
mod m20260802_000001_seed_subjects;
mod m20260802_000002_seed_grades;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_user_table::Migration),
            Box::new(m20260801_000002_create_otp_table::Migration),
            Box::new(m20260801_000003_create_subject_table::Migration),
            Box::new(m20260801_000004_create_grade_table::Migration),
            Box::new(m20260801_000005_create_tutor_table::Migration),
            Box::new(m20260801_000006_create_tutor_subject_table::Migration),
            Box::new(m20260801_000007_create_tutor_grade_table::Migration),
            Box::new(m20260801_000008_create_certificate_table::Migration),
            Box::new(m20260801_000009_create_feedback_table::Migration),
            Box::new(m20260801_000010_create_parent_table::Migration),
            Box::new(m20260801_000011_create_student_table::Migration),
            Box::new(m20260802_000001_seed_subjects::Migration),
            Box::new(m20260802_000002_seed_grades::Migration),
        ]
    }
}
