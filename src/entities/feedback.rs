use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rating and comment left by a student or parent for a tutor.
///
/// At most one row exists per (tutor, author) pair, enforced by a unique
/// index alongside the service-level existence check.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub author_user_id: Uuid,
    /// `"student"` or `"parent"`.
    pub author_role: String,
    /// 1 to 5.
    pub rating: i32,
    pub comment: Option<String>,
    /// `"visible"`, `"hidden"`, or `"reported"`.
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
        belongs_to = "super::user::Entity",
        from = "Column::AuthorUserId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::tutor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutor.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
