//! OTP ledger: short-lived verification codes keyed by (email, purpose).
//!
//! Registration codes stage the pending registration payload so no user row
//! exists until the code is verified; password-reset codes carry no payload.

use chrono::Utc;
use rand::Rng;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::otp;
use crate::error::AppError;

pub const PURPOSE_REGISTRATION: &str = "registration";
pub const PURPOSE_FORGOT_PASSWORD: &str = "forgot_password";

/// Codes expire 10 minutes after issue.
pub const TTL_MINUTES: i64 = 10;
/// Minimum gap between two codes for the same (email, purpose).
pub const RESEND_COOLDOWN_SECS: i64 = 60;
/// Verification attempts allowed per code.
pub const MAX_ATTEMPTS: i32 = 5;

/// Data staged inside an OTP row until verification commits it.
///
/// Tagged by purpose so arbitrary client fields can never ride along into a
/// later user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum StagedPayload {
    Registration {
        email: String,
        password_hash: String,
        phone: String,
        role: String,
    },
}

/// Generate a random 4-digit numeric code.
#[must_use]
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..10000).to_string()
}

/// Issue a fresh code for (email, purpose), superseding any prior codes.
///
/// # Errors
///
/// Returns `AppError::Internal` on database failure.
pub async fn issue<C: ConnectionTrait>(
    db: &C,
    email: &str,
    purpose: &str,
    staged_payload: Option<&StagedPayload>,
) -> Result<otp::Model, AppError> {
    otp::Entity::delete_many()
        .filter(otp::Column::Email.eq(email))
        .filter(otp::Column::Purpose.eq(purpose))
        .exec(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let staged_json = staged_payload
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))?;

    let now = Utc::now().fixed_offset();
    let record = otp::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        code: Set(generate_code()),
        purpose: Set(purpose.to_string()),
        expires_at: Set((Utc::now() + chrono::Duration::minutes(TTL_MINUTES)).fixed_offset()),
        verified: Set(false),
        attempts: Set(0),
        staged_payload: Set(staged_json),
        created_at: Set(now),
        updated_at: Set(now),
    };

    record
        .insert(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Verify a code for (email, purpose).
///
/// On success the row is marked verified and the staged payload (if any) is
/// returned. The attempt counter is checked before the code is compared, so
/// the 6th attempt fails even with the right code.
///
/// # Errors
///
/// `NotFound` when no unverified code exists, `BadRequest` when expired or
/// mismatched (with remaining attempts), `RateLimited` past the attempt cap.
pub async fn verify<C: ConnectionTrait>(
    db: &C,
    email: &str,
    code: &str,
    purpose: &str,
) -> Result<Option<StagedPayload>, AppError> {
    let record = otp::Entity::find()
        .filter(otp::Column::Email.eq(email))
        .filter(otp::Column::Purpose.eq(purpose))
        .filter(otp::Column::Verified.eq(false))
        .order_by_desc(otp::Column::CreatedAt)
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("OTP not found or already verified.".to_string()))?;

    if Utc::now().fixed_offset() > record.expires_at {
        return Err(AppError::BadRequest("OTP has expired.".to_string()));
    }

    if record.attempts >= MAX_ATTEMPTS {
        return Err(AppError::RateLimited(
            "Maximum verification attempts exceeded.".to_string(),
        ));
    }

    if record.code != code {
        let attempts = record.attempts + 1;
        let mut active: otp::ActiveModel = record.into();
        active.attempts = Set(attempts);
        active.updated_at = Set(Utc::now().fixed_offset());
        active
            .update(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        return Err(AppError::BadRequest(format!(
            "Invalid OTP. {} attempts remaining.",
            MAX_ATTEMPTS - attempts
        )));
    }

    let staged = record
        .staged_payload
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut active: otp::ActiveModel = record.into();
    active.verified = Set(true);
    active.updated_at = Set(Utc::now().fixed_offset());
    active
        .update(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(staged)
}

/// Re-issue a code for (email, purpose), carrying any staged payload forward.
///
/// # Errors
///
/// `RateLimited` when a code was issued within the last 60 seconds.
pub async fn resend<C: ConnectionTrait>(
    db: &C,
    email: &str,
    purpose: &str,
) -> Result<otp::Model, AppError> {
    let cooldown_floor = (Utc::now() - chrono::Duration::seconds(RESEND_COOLDOWN_SECS)).fixed_offset();

    let recent = otp::Entity::find()
        .filter(otp::Column::Email.eq(email))
        .filter(otp::Column::Purpose.eq(purpose))
        .filter(otp::Column::CreatedAt.gte(cooldown_floor))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if recent.is_some() {
        return Err(AppError::RateLimited(
            "Please wait 1 minute before requesting a new OTP.".to_string(),
        ));
    }

    // Carry the previously staged payload into the new code
    let previous = otp::Entity::find()
        .filter(otp::Column::Email.eq(email))
        .filter(otp::Column::Purpose.eq(purpose))
        .order_by_desc(otp::Column::CreatedAt)
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let staged: Option<StagedPayload> = previous
        .and_then(|r| r.staged_payload)
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))?;

    issue(db, email, purpose, staged.as_ref()).await
}

/// Delete expired rows. Safe to run periodically; expiry is also enforced
/// at verification time.
///
/// # Errors
///
/// Returns `AppError::Internal` on database failure.
pub async fn purge_expired<C: ConnectionTrait>(db: &C) -> Result<u64, AppError> {
    let result = otp::Entity::delete_many()
        .filter(otp::Column::ExpiresAt.lt(Utc::now().fixed_offset()))
        .exec(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if result.rows_affected > 0 {
        tracing::debug!(count = result.rows_affected, "Purged expired OTP codes");
    }
    Ok(result.rows_affected)
}
