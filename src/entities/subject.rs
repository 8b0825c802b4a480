use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog of teachable subjects, seeded by migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subject")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// `"active"` or `"inactive"`.
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::tutor::Entity> for Entity {
    fn to() -> RelationDef {
        super::tutor_subject::Relation::Tutor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::tutor_subject::Relation::Subject.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
