use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::auth::jwt;
use crate::auth::middleware::AuthUser;
use crate::auth::password;
use crate::email;
use crate::entities::{tutor, user};
use crate::error::AppError;
use crate::onboarding;
use crate::otp;
use crate::response::ApiResponse;
use crate::routes::users::{UserResponse, user_response};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Tutor onboarding snapshot returned alongside the login token so clients
/// can route straight to the right onboarding step.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileStatus {
    completed: bool,
    current_step: i32,
    completed_steps: Vec<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_status: Option<ProfileStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    email: String,
    otp: String,
    new_password: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/login`
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let email = body.email.trim().to_lowercase();

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password.".to_string()))?;

    if !password::verify_password(&body.password, &user_model.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password.".to_string(),
        ));
    }

    if user_model.status != "active" {
        return Err(AppError::Forbidden(
            "Your account is not active. Please contact support.".to_string(),
        ));
    }

    let token = jwt::generate_token(
        user_model.id,
        &user_model.email,
        &user_model.role,
        &state.config,
    )?;

    let now = Utc::now().fixed_offset();
    let mut active: user::ActiveModel = user_model.clone().into();
    active.last_login_at = Set(Some(now));
    active.updated_at = Set(now);
    let user_model = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    // Tutors get their onboarding snapshot so clients can resume the flow
    let profile_status = if user_model.role == "tutor" {
        tutor::Entity::find()
            .filter(tutor::Column::UserId.eq(user_model.id))
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map(|t| ProfileStatus {
                completed: t.is_profile_complete,
                current_step: t.current_step,
                completed_steps: onboarding::steps_from_json(&t.completed_steps),
            })
    } else {
        None
    };

    Ok(Json(ApiResponse::ok(
        "Login successful.",
        LoginResponse {
            token,
            user: user_response(&user_model),
            profile_status,
        },
    )))
}

/// `GET /api/v1/auth/me`
async fn me(AuthUser(user_model): AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(
        "User retrieved successfully.",
        user_response(&user_model),
    ))
}

/// `POST /api/v1/auth/change-password`
async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !password::verify_password(&body.current_password, &user_model.password_hash)? {
        return Err(AppError::Unauthorized(
            "Current password is incorrect.".to_string(),
        ));
    }

    password::validate_password(&body.new_password).map_err(AppError::BadRequest)?;

    if body.new_password == body.current_password {
        return Err(AppError::BadRequest(
            "New password must be different from the current password.".to_string(),
        ));
    }

    let mut active: user::ActiveModel = user_model.into();
    active.password_hash = Set(password::hash_password(&body.new_password)?);
    active.updated_at = Set(Utc::now().fixed_offset());
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::message("Password changed successfully.")))
}

/// `POST /api/v1/auth/forgot-password`
///
/// Always responds success so the endpoint cannot be used to probe which
/// emails are registered.
async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email = body.email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if existing.is_some() {
        let record = otp::issue(&state.db, &email, otp::PURPOSE_FORGOT_PASSWORD, None).await?;
        email::send_otp_email(&email, &record.code, otp::PURPOSE_FORGOT_PASSWORD);
    }

    Ok(Json(ApiResponse::message(
        "If the email is registered, a reset code has been sent.",
    )))
}

/// `POST /api/v1/auth/reset-password`
async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email = body.email.trim().to_lowercase();

    password::validate_password(&body.new_password).map_err(AppError::BadRequest)?;

    otp::verify(&state.db, &email, &body.otp, otp::PURPOSE_FORGOT_PASSWORD).await?;

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    active.password_hash = Set(password::hash_password(&body.new_password)?);
    active.updated_at = Set(Utc::now().fixed_offset());
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::message(
        "Password reset successfully. Please login with your new password.",
    )))
}
