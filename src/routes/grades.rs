use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::grade;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grades))
        .route("/{id}", get(get_grade))
}

/// `GET /api/v1/grades` — active grades in curriculum order.
async fn list_grades(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<grade::Model>>>, AppError> {
    let grades = grade::Entity::find()
        .filter(grade::Column::Status.eq("active"))
        .order_by_asc(grade::Column::OrderNumber)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Grades retrieved successfully.",
        grades,
    )))
}

/// `GET /api/v1/grades/{id}`
async fn get_grade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<grade::Model>>, AppError> {
    let grade_model = grade::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Grade not found.".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "Grade retrieved successfully.",
        grade_model,
    )))
}
