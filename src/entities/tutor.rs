use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tutor profile built up across the 4-step onboarding wizard.
///
/// `completed_steps` holds a JSON array of step numbers with set semantics;
/// `is_profile_complete` is true exactly when it covers {1,2,3,4}. Only
/// `"approved"` and complete profiles are publicly searchable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutor")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    /// `"male"`, `"female"`, or `"other"`.
    pub gender: String,
    pub date_of_birth: Date,
    pub place_of_birth: Option<String>,
    pub address: Option<String>,
    pub teaching_area: Option<String>,
    pub bio: Option<String>,
    #[serde(skip_serializing)]
    pub identity_number: Option<String>,
    pub hourly_rate: f64,
    /// `"draft"`, `"submitted"`, `"approved"`, or `"rejected"`.
    pub profile_status: String,
    pub current_step: i32,
    /// JSON array of completed step numbers, e.g. `[1, 2]`.
    pub completed_steps: Json,
    pub is_profile_complete: bool,
    pub average_rating: f64,
    pub total_feedback: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::certificate::Entity")]
    Certificate,
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificate.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        super::tutor_subject::Relation::Subject.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::tutor_subject::Relation::Tutor.def().rev())
    }
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        super::tutor_grade::Relation::Grade.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::tutor_grade::Relation::Tutor.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
