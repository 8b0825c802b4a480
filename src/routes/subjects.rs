use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::subject;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects))
        .route("/search", get(search_subjects))
        .route("/{id}", get(get_subject))
}

#[derive(Deserialize)]
struct SearchSubjectsQuery {
    q: Option<String>,
}

/// `GET /api/v1/subjects` — active subjects.
async fn list_subjects(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<subject::Model>>>, AppError> {
    let subjects = subject::Entity::find()
        .filter(subject::Column::Status.eq("active"))
        .order_by_asc(subject::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Subjects retrieved successfully.",
        subjects,
    )))
}

/// `GET /api/v1/subjects/search?q=` — name substring, case-insensitive.
async fn search_subjects(
    State(state): State<AppState>,
    Query(query): Query<SearchSubjectsQuery>,
) -> Result<Json<ApiResponse<Vec<subject::Model>>>, AppError> {
    let mut finder = subject::Entity::find().filter(subject::Column::Status.eq("active"));

    if let Some(ref q) = query.q
        && !q.trim().is_empty()
    {
        let needle = format!("%{}%", q.trim().to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((
                subject::Entity,
                subject::Column::Name,
            ))))
            .like(needle),
        );
    }

    let subjects = finder
        .order_by_asc(subject::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Subjects retrieved successfully.",
        subjects,
    )))
}

/// `GET /api/v1/subjects/{id}`
async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<subject::Model>>, AppError> {
    let subject_model = subject::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Subject not found.".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "Subject retrieved successfully.",
        subject_model,
    )))
}
