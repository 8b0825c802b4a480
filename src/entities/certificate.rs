use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Education credential owned by exactly one tutor profile.
///
/// `images` is a JSON array of stored image URLs; deleting the certificate
/// also removes the images from storage (best effort).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub school_name: String,
    pub major: String,
    /// `"studying"`, `"graduated"`, or `"not_graduated"`.
    pub education_status: String,
    /// JSON array of stored image URLs.
    pub images: Json,
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
}

impl Related<super::tutor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
