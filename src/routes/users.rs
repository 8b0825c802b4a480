use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::password;
use crate::email;
use crate::entities::user;
use crate::error::{AppError, FieldError};
use crate::otp::{self, StagedPayload};
use crate::response::{ApiResponse, Paginated, clamp_pagination};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    email: Option<String>,
    password: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
struct ListUsersQuery {
    role: Option<String>,
    status: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn user_response(u: &user::Model) -> UserResponse {
    UserResponse {
        id: u.id,
        email: u.email.clone(),
        phone: u.phone.clone(),
        role: u.role.clone(),
        status: u.status.clone(),
        last_login_at: u.last_login_at.map(|t| t.to_rfc3339()),
        created_at: u.created_at.to_rfc3339(),
    }
}

fn validate_role(role: &str) -> Result<(), String> {
    match role {
        "student" | "tutor" | "parent" => Ok(()),
        _ => Err("Role must be one of: student, tutor, parent.".to_string()),
    }
}

async fn find_by_email(
    db: &sea_orm::DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

fn validate_registration(body: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if let Err(msg) = password::validate_email(&body.email) {
        errors.push(FieldError::new("email", msg));
    }
    if let Err(msg) = password::validate_password(&body.password) {
        errors.push(FieldError::new("password", msg));
    }
    if let Err(msg) = password::validate_phone(&body.phone) {
        errors.push(FieldError::new("phone", msg));
    }
    if let Err(msg) = validate_role(&body.role) {
        errors.push(FieldError::new("role", msg));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/users/register`
///
/// Stages the registration inside an OTP record; no user row is created
/// until the code is verified.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    validate_registration(&body)?;
    let email = body.email.trim().to_lowercase();

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists.".to_string()));
    }

    // Stage the hashed credential, never the plaintext
    let password_hash = password::hash_password(&body.password)?;
    let staged = StagedPayload::Registration {
        email: email.clone(),
        password_hash,
        phone: body.phone.trim().to_string(),
        role: body.role.clone(),
    };

    let record = otp::issue(&state.db, &email, otp::PURPOSE_REGISTRATION, Some(&staged)).await?;
    email::send_otp_email(&email, &record.code, otp::PURPOSE_REGISTRATION);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            "OTP sent to your email. Please verify to complete registration.",
            serde_json::json!({ "email": email }),
        )),
    )
        .into_response())
}

/// `POST /api/v1/users/verify-otp`
///
/// Verifies the code and commits the staged registration as an active user.
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();

    let staged = otp::verify(&state.db, &email, &body.otp, otp::PURPOSE_REGISTRATION)
        .await?
        .ok_or_else(|| AppError::BadRequest("Registration data not found.".to_string()))?;

    let StagedPayload::Registration {
        email: staged_email,
        password_hash,
        phone,
        role,
    } = staged;

    // Close the race window: the email may have been registered between
    // register and verify
    if find_by_email(&state.db, &staged_email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists.".to_string()));
    }

    let now = Utc::now().fixed_offset();
    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(staged_email.clone()),
        password_hash: Set(password_hash),
        phone: Set(phone),
        role: Set(role),
        status: Set("active".to_string()),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let user_model = new_user
        .insert(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    // Best-effort; registration has already succeeded
    email::send_welcome_email(&staged_email);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Registration completed successfully. Please login to continue.",
            user_response(&user_model),
        )),
    )
        .into_response())
}

/// `POST /api/v1/users/resend-otp`
async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email = body.email.trim().to_lowercase();

    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::BadRequest(
            "Email already registered. Please login.".to_string(),
        ));
    }

    let record = otp::resend(&state.db, &email, otp::PURPOSE_REGISTRATION).await?;
    email::send_otp_email(&email, &record.code, otp::PURPOSE_REGISTRATION);

    Ok(Json(ApiResponse::message("OTP resent successfully.")))
}

/// `GET /api/v1/users`
async fn list_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Paginated<UserResponse>>>, AppError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);

    let mut finder = user::Entity::find();
    if let Some(ref role) = query.role {
        finder = finder.filter(user::Column::Role.eq(role));
    }
    if let Some(ref status) = query.status {
        finder = finder.filter(user::Column::Status.eq(status));
    }

    let paginator = finder.paginate(&state.db, limit);
    let total = paginator
        .num_items()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let users = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let items = users.iter().map(user_response).collect();
    Ok(Json(ApiResponse::ok(
        "Users retrieved successfully.",
        Paginated::new(items, page, limit, total),
    )))
}

/// `GET /api/v1/users/{id}`
async fn get_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "User retrieved successfully.",
        user_response(&user_model),
    )))
}

/// `PUT /api/v1/users/{id}`
async fn update_user(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    if acting.id != id {
        return Err(AppError::Forbidden(
            "You can only update your own account.".to_string(),
        ));
    }

    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();

    if let Some(ref new_email) = body.email {
        let new_email = new_email.trim().to_lowercase();
        password::validate_email(&new_email).map_err(AppError::BadRequest)?;

        let existing = find_by_email(&state.db, &new_email).await?;
        if let Some(existing_user) = existing
            && existing_user.id != id
        {
            return Err(AppError::Conflict("Email already exists.".to_string()));
        }
        active.email = Set(new_email);
    }

    if let Some(ref new_password) = body.password {
        password::validate_password(new_password).map_err(AppError::BadRequest)?;
        active.password_hash = Set(password::hash_password(new_password)?);
    }

    if let Some(ref phone) = body.phone {
        password::validate_phone(phone).map_err(AppError::BadRequest)?;
        active.phone = Set(phone.trim().to_string());
    }

    active.updated_at = Set(Utc::now().fixed_offset());
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "User updated successfully.",
        user_response(&updated),
    )))
}

/// `DELETE /api/v1/users/{id}`
async fn delete_user(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if acting.id != id {
        return Err(AppError::Forbidden(
            "You can only delete your own account.".to_string(),
        ));
    }

    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    user_model
        .delete(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
