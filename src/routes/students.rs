use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::student;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/profile",
        post(create_profile)
            .get(get_profile)
            .put(update_profile)
            .delete(delete_profile),
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStudentRequest {
    full_name: String,
    date_of_birth: Option<String>,
    gender: Option<String>,
    grade: Option<String>,
    school: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStudentRequest {
    full_name: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    grade: Option<String>,
    school: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Date must be in YYYY-MM-DD format.".to_string()))
}

async fn require_own_student(
    db: &sea_orm::DatabaseConnection,
    user_id: Uuid,
) -> Result<student::Model, AppError> {
    student::Entity::find()
        .filter(student::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Student profile not found.".to_string()))
}

/// `POST /api/v1/students/profile`
async fn create_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Json(body): Json<CreateStudentRequest>,
) -> Result<Response, AppError> {
    if acting.role != "student" {
        return Err(AppError::BadRequest(
            "Only student accounts can create a student profile.".to_string(),
        ));
    }

    let existing = student::Entity::find()
        .filter(student::Column::UserId.eq(acting.id))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Student profile already exists.".to_string(),
        ));
    }

    if body.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Full name is required.".to_string()));
    }

    let date_of_birth = body.date_of_birth.as_deref().map(parse_date).transpose()?;

    let now = Utc::now().fixed_offset();
    let new_student = student::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(acting.id),
        parent_id: Set(None),
        full_name: Set(body.full_name.trim().to_string()),
        date_of_birth: Set(date_of_birth),
        gender: Set(body.gender),
        grade: Set(body.grade),
        school: Set(body.school),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let student_model = new_student
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Student profile created successfully.",
            student_model,
        )),
    )
        .into_response())
}

/// `GET /api/v1/students/profile`
async fn get_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
) -> Result<Json<ApiResponse<student::Model>>, AppError> {
    let student_model = require_own_student(&state.db, acting.id).await?;

    Ok(Json(ApiResponse::ok(
        "Student profile retrieved successfully.",
        student_model,
    )))
}

/// `PUT /api/v1/students/profile`
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Json(body): Json<UpdateStudentRequest>,
) -> Result<Json<ApiResponse<student::Model>>, AppError> {
    let student_model = require_own_student(&state.db, acting.id).await?;

    let mut active: student::ActiveModel = student_model.into();
    if let Some(full_name) = body.full_name {
        if full_name.trim().is_empty() {
            return Err(AppError::BadRequest("Full name is required.".to_string()));
        }
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(ref raw) = body.date_of_birth {
        active.date_of_birth = Set(Some(parse_date(raw)?));
    }
    if body.gender.is_some() {
        active.gender = Set(body.gender);
    }
    if body.grade.is_some() {
        active.grade = Set(body.grade);
    }
    if body.school.is_some() {
        active.school = Set(body.school);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Student profile updated successfully.",
        updated,
    )))
}

/// `DELETE /api/v1/students/profile`
async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
) -> Result<StatusCode, AppError> {
    let student_model = require_own_student(&state.db, acting.id).await?;

    student_model
        .delete(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
