use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::parent;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", post(create_profile).get(get_profile))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateParentRequest {
    full_name: String,
    avatar_url: Option<String>,
    address: Option<String>,
}

/// `POST /api/v1/parents/profile`
async fn create_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Json(body): Json<CreateParentRequest>,
) -> Result<Response, AppError> {
    if acting.role != "parent" {
        return Err(AppError::BadRequest(
            "Only parent accounts can create a parent profile.".to_string(),
        ));
    }

    let existing = parent::Entity::find()
        .filter(parent::Column::UserId.eq(acting.id))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Parent profile already exists.".to_string(),
        ));
    }

    if body.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Full name is required.".to_string()));
    }

    let now = Utc::now().fixed_offset();
    let new_parent = parent::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(acting.id),
        full_name: Set(body.full_name.trim().to_string()),
        avatar_url: Set(body.avatar_url),
        address: Set(body.address),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let parent_model = new_parent
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Parent profile created successfully.",
            parent_model,
        )),
    )
        .into_response())
}

/// `GET /api/v1/parents/profile`
async fn get_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
) -> Result<Json<ApiResponse<parent::Model>>, AppError> {
    let parent_model = parent::Entity::find()
        .filter(parent::Column::UserId.eq(acting.id))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Parent profile not found.".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "Parent profile retrieved successfully.",
        parent_model,
    )))
}
