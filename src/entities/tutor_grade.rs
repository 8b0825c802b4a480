use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join table linking tutors to the grade levels they teach.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutor_grade")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tutor_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub grade_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tutor::Entity",
        from = "Column::TutorId",
        to = "super::tutor::Column::Id"
    )]
    Tutor,
    #[sea_orm(
        belongs_to = "super::grade::Entity",
        from = "Column::GradeId",
        to = "super::grade::Column::Id"
    )]
    Grade,
}

impl ActiveModelBehavior for ActiveModel {}
