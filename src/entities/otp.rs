use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Short-lived verification code keyed by (email, purpose).
///
/// Registration codes also stage the pending registration payload until the
/// code is verified and the user row is committed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otp")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    /// 4-digit numeric code.
    pub code: String,
    /// `"registration"` or `"forgot_password"`.
    pub purpose: String,
    pub expires_at: DateTimeWithTimeZone,
    pub verified: bool,
    pub attempts: i32,
    /// Tagged `StagedPayload` JSON; `None` for password-reset codes.
    pub staged_payload: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
