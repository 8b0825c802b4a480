use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, LoaderTrait,
    ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::middleware::{AuthUser, MaybeAuthUser};
use crate::entities::{
    certificate, feedback, grade, parent, student, subject, tutor, tutor_grade, tutor_subject, user,
};
use crate::error::AppError;
use crate::onboarding::{self, Progress};
use crate::response::{ApiResponse, Paginated, clamp_pagination};
use crate::state::AppState;
use crate::storage;

/// Folder under the upload dir where certificate scans are stored.
const CERTIFICATE_FOLDER: &str = "certificates";

/// Request-body cap for certificate uploads. Axum's default 2 MB limit
/// would reject images the per-image cap allows, so the multipart routes
/// get room for a batch of images at [`storage::MAX_IMAGE_BYTES`] each;
/// individual files past the per-image cap still come back as 413.
const CERTIFICATE_BODY_LIMIT: usize = 8 * storage::MAX_IMAGE_BYTES;

pub fn router() -> Router<AppState> {
    let certificates = Router::new()
        .route(
            "/certificates",
            post(create_certificate).get(list_certificates),
        )
        .route(
            "/certificates/{id}",
            axum::routing::put(update_certificate).delete(delete_certificate),
        )
        .route("/certificates/{id}/images", delete(delete_certificate_images))
        .layer(DefaultBodyLimit::max(CERTIFICATE_BODY_LIMIT));

    Router::new()
        .route("/search", get(search_tutors))
        .route("/", get(list_tutors))
        .route(
            "/profile",
            post(create_profile).get(get_own_profile).put(update_profile),
        )
        .route("/profile/progress", get(get_progress))
        .route("/profile/{user_id}", get(get_profile_by_user))
        .merge(certificates)
        .route("/{id}/detail", get(tutor_detail))
        .route("/{id}/feedbacks", get(list_feedbacks).post(create_feedback))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRef {
    id: Uuid,
    code: String,
    name: String,
}

impl CatalogRef {
    fn from_subject(s: &subject::Model) -> Self {
        Self {
            id: s.id,
            code: s.code.clone(),
            name: s.name.clone(),
        }
    }

    fn from_grade(g: &grade::Model) -> Self {
        Self {
            id: g.id,
            code: g.code.clone(),
            name: g.name.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TutorResponse {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    avatar_url: Option<String>,
    gender: String,
    date_of_birth: String,
    place_of_birth: Option<String>,
    address: Option<String>,
    teaching_area: Option<String>,
    bio: Option<String>,
    hourly_rate: f64,
    profile_status: String,
    current_step: i32,
    completed_steps: Vec<i32>,
    is_profile_complete: bool,
    average_rating: f64,
    total_feedback: i32,
    subjects: Vec<CatalogRef>,
    grades: Vec<CatalogRef>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TutorDetailResponse {
    #[serde(flatten)]
    tutor: TutorResponse,
    certificates: Vec<certificate::Model>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressResponse {
    current_step: i32,
    completed_steps: Vec<i32>,
    is_profile_complete: bool,
    profile_status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProfileRequest {
    email: Option<String>,
    full_name: String,
    date_of_birth: String,
    gender: String,
    hourly_rate: f64,
    avatar_url: Option<String>,
    place_of_birth: Option<String>,
    address: Option<String>,
    teaching_area: Option<String>,
    bio: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    email: Option<String>,
    full_name: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    hourly_rate: Option<f64>,
    avatar_url: Option<String>,
    place_of_birth: Option<String>,
    address: Option<String>,
    teaching_area: Option<String>,
    bio: Option<String>,
    identity_number: Option<String>,
    /// Subject codes, e.g. `["math", "physics"]`.
    subjects: Option<Vec<String>>,
    /// Grade codes, e.g. `["grade_10"]`.
    grades: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    name: Option<String>,
    /// Comma-separated subject codes.
    subjects: Option<String>,
    /// Comma-separated grade codes.
    grades: Option<String>,
    teaching_area: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Deserialize)]
struct CreateFeedbackRequest {
    rating: i32,
    comment: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackResponse {
    id: Uuid,
    rating: i32,
    comment: Option<String>,
    author_role: String,
    author_name: String,
    created_at: String,
}

#[derive(Deserialize)]
struct DeleteImagesRequest {
    images: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the acting user from either the bearer token or an `email` field,
/// the flexible identification contract used throughout onboarding.
async fn resolve_acting_user(
    db: &DatabaseConnection,
    maybe_user: Option<user::Model>,
    email: Option<&str>,
) -> Result<user::Model, AppError> {
    if let Some(user_model) = maybe_user {
        return Ok(user_model);
    }

    let email = email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Authentication token or email is required.".to_string())
        })?;

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if user_model.status != "active" {
        return Err(AppError::Forbidden(
            "Account is deactivated. Please contact support.".to_string(),
        ));
    }

    Ok(user_model)
}

async fn find_tutor_by_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Option<tutor::Model>, AppError> {
    tutor::Entity::find()
        .filter(tutor::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

async fn require_own_tutor(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<tutor::Model, AppError> {
    find_tutor_by_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tutor profile not found.".to_string()))
}

fn validate_gender(gender: &str) -> Result<(), AppError> {
    match gender {
        "male" | "female" | "other" => Ok(()),
        _ => Err(AppError::BadRequest(
            "Gender must be one of: male, female, other.".to_string(),
        )),
    }
}

fn validate_education_status(status: &str) -> Result<(), AppError> {
    match status {
        "studying" | "graduated" | "not_graduated" => Ok(()),
        _ => Err(AppError::BadRequest(
            "Education status must be one of: studying, graduated, not_graduated.".to_string(),
        )),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Date must be in YYYY-MM-DD format.".to_string()))
}

fn image_urls(images: &Value) -> Vec<String> {
    images.as_array().map_or_else(Vec::new, |arr| {
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

async fn tutor_response(
    db: &DatabaseConnection,
    tutor_model: &tutor::Model,
) -> Result<TutorResponse, AppError> {
    let subjects = tutor_model
        .find_related(subject::Entity)
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let grades = tutor_model
        .find_related(grade::Entity)
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(build_tutor_response(tutor_model, &subjects, &grades))
}

fn build_tutor_response(
    t: &tutor::Model,
    subjects: &[subject::Model],
    grades: &[grade::Model],
) -> TutorResponse {
    TutorResponse {
        id: t.id,
        user_id: t.user_id,
        full_name: t.full_name.clone(),
        avatar_url: t.avatar_url.clone(),
        gender: t.gender.clone(),
        date_of_birth: t.date_of_birth.to_string(),
        place_of_birth: t.place_of_birth.clone(),
        address: t.address.clone(),
        teaching_area: t.teaching_area.clone(),
        bio: t.bio.clone(),
        hourly_rate: t.hourly_rate,
        profile_status: t.profile_status.clone(),
        current_step: t.current_step,
        completed_steps: onboarding::steps_from_json(&t.completed_steps),
        is_profile_complete: t.is_profile_complete,
        average_rating: t.average_rating,
        total_feedback: t.total_feedback,
        subjects: subjects.iter().map(CatalogRef::from_subject).collect(),
        grades: grades.iter().map(CatalogRef::from_grade).collect(),
    }
}

async fn load_tutor_responses(
    db: &DatabaseConnection,
    tutors: Vec<tutor::Model>,
) -> Result<Vec<TutorResponse>, AppError> {
    let subjects = tutors
        .load_many_to_many(subject::Entity, tutor_subject::Entity, db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let grades = tutors
        .load_many_to_many(grade::Entity, tutor_grade::Entity, db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(tutors
        .iter()
        .zip(subjects.iter().zip(grades.iter()))
        .map(|(t, (s, g))| build_tutor_response(t, s, g))
        .collect())
}

/// Average over visible feedback, rounded to 1 decimal, with the row count.
async fn calculate_average_rating<C: ConnectionTrait>(
    db: &C,
    tutor_id: Uuid,
) -> Result<(f64, i32), AppError> {
    let rows = feedback::Entity::find()
        .filter(feedback::Column::TutorId.eq(tutor_id))
        .filter(feedback::Column::Status.eq("visible"))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let count = i32::try_from(rows.len()).unwrap_or(i32::MAX);
    if count == 0 {
        return Ok((0.0, 0));
    }

    let sum: i64 = rows.iter().map(|r| i64::from(r.rating)).sum();
    let average = (sum as f64 / f64::from(count) * 10.0).round() / 10.0;
    Ok((average, count))
}

/// Persist a progress transition, flipping draft to submitted when the
/// profile just became complete.
fn apply_progress(active: &mut tutor::ActiveModel, progress: &Progress, just_completed: bool) {
    active.current_step = Set(progress.current_step);
    active.completed_steps = Set(progress.steps_json());
    active.is_profile_complete = Set(progress.is_profile_complete);
    if just_completed {
        active.profile_status = Set("submitted".to_string());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public search and listing
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/tutors/search`
///
/// Only approved, complete profiles ever appear in results.
async fn search_tutors(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Paginated<TutorResponse>>>, AppError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);

    let mut finder = tutor::Entity::find()
        .filter(tutor::Column::ProfileStatus.eq("approved"))
        .filter(tutor::Column::IsProfileComplete.eq(true));

    if let Some(ref name) = query.name {
        let needle = format!("%{}%", name.trim().to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((
                tutor::Entity,
                tutor::Column::FullName,
            ))))
            .like(needle),
        );
    }

    if let Some(ref area) = query.teaching_area {
        let needle = format!("%{}%", area.trim().to_lowercase());
        finder = finder.filter(
            Expr::expr(Func::lower(Expr::col((
                tutor::Entity,
                tutor::Column::TeachingArea,
            ))))
            .like(needle),
        );
    }

    if let Some(ref codes) = query.subjects {
        let ids = subject_ids_for_codes(&state.db, codes).await?;
        let tutor_ids = tutor_ids_for_subjects(&state.db, &ids).await?;
        finder = finder.filter(tutor::Column::Id.is_in(tutor_ids));
    }

    if let Some(ref codes) = query.grades {
        let ids = grade_ids_for_codes(&state.db, codes).await?;
        let tutor_ids = tutor_ids_for_grades(&state.db, &ids).await?;
        finder = finder.filter(tutor::Column::Id.is_in(tutor_ids));
    }

    let order = match query.sort_order.as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    };
    finder = match query.sort_by.as_deref() {
        Some("hourlyRate" | "hourly_rate") => finder.order_by(tutor::Column::HourlyRate, order),
        Some("newest" | "createdAt" | "created_at") => {
            finder.order_by(tutor::Column::CreatedAt, order)
        }
        _ => finder.order_by(tutor::Column::AverageRating, order),
    };

    let paginator = finder.paginate(&state.db, limit);
    let total = paginator
        .num_items()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let tutors = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let items = load_tutor_responses(&state.db, tutors).await?;
    Ok(Json(ApiResponse::ok(
        "Tutors retrieved successfully.",
        Paginated::new(items, page, limit, total),
    )))
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

async fn subject_ids_for_codes(
    db: &DatabaseConnection,
    codes: &str,
) -> Result<Vec<Uuid>, AppError> {
    let rows = subject::Entity::find()
        .filter(subject::Column::Code.is_in(split_codes(codes)))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(rows.into_iter().map(|s| s.id).collect())
}

async fn grade_ids_for_codes(db: &DatabaseConnection, codes: &str) -> Result<Vec<Uuid>, AppError> {
    let rows = grade::Entity::find()
        .filter(grade::Column::Code.is_in(split_codes(codes)))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(rows.into_iter().map(|g| g.id).collect())
}

async fn tutor_ids_for_subjects(
    db: &DatabaseConnection,
    subject_ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let rows = tutor_subject::Entity::find()
        .filter(tutor_subject::Column::SubjectId.is_in(subject_ids.to_vec()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(rows.into_iter().map(|r| r.tutor_id).collect())
}

async fn tutor_ids_for_grades(
    db: &DatabaseConnection,
    grade_ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let rows = tutor_grade::Entity::find()
        .filter(tutor_grade::Column::GradeId.is_in(grade_ids.to_vec()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(rows.into_iter().map(|r| r.tutor_id).collect())
}

/// `GET /api/v1/tutors` — approved listing ordered by rating.
async fn list_tutors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<TutorResponse>>>, AppError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);

    let paginator = tutor::Entity::find()
        .filter(tutor::Column::ProfileStatus.eq("approved"))
        .filter(tutor::Column::IsProfileComplete.eq(true))
        .order_by_desc(tutor::Column::AverageRating)
        .paginate(&state.db, limit);

    let total = paginator
        .num_items()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let tutors = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let items = load_tutor_responses(&state.db, tutors).await?;
    Ok(Json(ApiResponse::ok(
        "Tutors retrieved successfully.",
        Paginated::new(items, page, limit, total),
    )))
}

/// `GET /api/v1/tutors/{id}/detail` — public detail, approved+complete only.
async fn tutor_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TutorDetailResponse>>, AppError> {
    let tutor_model = tutor::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .filter(|t| t.profile_status == "approved" && t.is_profile_complete)
        .ok_or_else(|| AppError::NotFound("Tutor not found.".to_string()))?;

    let certificates = tutor_model
        .find_related(certificate::Entity)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let response = TutorDetailResponse {
        tutor: tutor_response(&state.db, &tutor_model).await?,
        certificates,
    };

    Ok(Json(ApiResponse::ok(
        "Tutor retrieved successfully.",
        response,
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Onboarding: profile
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/tutors/profile` — onboarding step 1.
async fn create_profile(
    State(state): State<AppState>,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    Json(body): Json<CreateProfileRequest>,
) -> Result<Response, AppError> {
    let acting = resolve_acting_user(&state.db, maybe_user, body.email.as_deref()).await?;

    if acting.role != "tutor" {
        return Err(AppError::BadRequest(
            "Only tutor accounts can create a tutor profile.".to_string(),
        ));
    }

    if find_tutor_by_user(&state.db, acting.id).await?.is_some() {
        return Err(AppError::Conflict(
            "Tutor profile already exists.".to_string(),
        ));
    }

    if body.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Full name is required.".to_string()));
    }
    validate_gender(&body.gender)?;
    let date_of_birth = parse_date(&body.date_of_birth)?;
    if body.hourly_rate <= 0.0 {
        return Err(AppError::BadRequest(
            "Hourly rate must be greater than zero.".to_string(),
        ));
    }

    let progress = Progress::after_step_one();
    let now = Utc::now().fixed_offset();
    let new_tutor = tutor::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(acting.id),
        full_name: Set(body.full_name.trim().to_string()),
        avatar_url: Set(body.avatar_url),
        gender: Set(body.gender),
        date_of_birth: Set(date_of_birth),
        place_of_birth: Set(body.place_of_birth),
        address: Set(body.address),
        teaching_area: Set(body.teaching_area),
        bio: Set(body.bio),
        identity_number: Set(None),
        hourly_rate: Set(body.hourly_rate),
        profile_status: Set("draft".to_string()),
        current_step: Set(progress.current_step),
        completed_steps: Set(progress.steps_json()),
        is_profile_complete: Set(false),
        average_rating: Set(0.0),
        total_feedback: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let tutor_model = new_tutor
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Tutor profile created successfully.",
            tutor_response(&state.db, &tutor_model).await?,
        )),
    )
        .into_response())
}

/// `PUT /api/v1/tutors/profile` — onboarding steps 2 and 4.
///
/// Which step completes is inferred from field presence; the subjects and
/// grades lists, when present, fully replace the existing assignments.
async fn update_profile(
    State(state): State<AppState>,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<TutorResponse>>, AppError> {
    let acting = resolve_acting_user(&state.db, maybe_user, body.email.as_deref()).await?;
    let tutor_model = require_own_tutor(&state.db, acting.id).await?;

    let has_identity = body
        .identity_number
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    let has_teaching_info = body.subjects.is_some() || body.grades.is_some();

    if let Some(ref gender) = body.gender {
        validate_gender(gender)?;
    }
    if let Some(rate) = body.hourly_rate
        && rate <= 0.0
    {
        return Err(AppError::BadRequest(
            "Hourly rate must be greater than zero.".to_string(),
        ));
    }

    let subject_ids = match body.subjects {
        Some(ref codes) => Some(resolve_subject_codes(&state.db, codes).await?),
        None => None,
    };
    let grade_ids = match body.grades {
        Some(ref codes) => Some(resolve_grade_codes(&state.db, codes).await?),
        None => None,
    };

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let tutor_id = tutor_model.id;
    let mut progress = Progress::from_parts(
        tutor_model.current_step,
        &tutor_model.completed_steps,
        tutor_model.is_profile_complete,
    );
    let mut active: tutor::ActiveModel = tutor_model.into();

    if let Some(full_name) = body.full_name {
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(gender) = body.gender {
        active.gender = Set(gender);
    }
    if let Some(ref raw) = body.date_of_birth {
        active.date_of_birth = Set(parse_date(raw)?);
    }
    if let Some(rate) = body.hourly_rate {
        active.hourly_rate = Set(rate);
    }
    if body.avatar_url.is_some() {
        active.avatar_url = Set(body.avatar_url);
    }
    if body.place_of_birth.is_some() {
        active.place_of_birth = Set(body.place_of_birth);
    }
    if body.address.is_some() {
        active.address = Set(body.address);
    }
    if body.teaching_area.is_some() {
        active.teaching_area = Set(body.teaching_area);
    }
    if body.bio.is_some() {
        active.bio = Set(body.bio);
    }
    if has_identity {
        active.identity_number = Set(body.identity_number.map(|n| n.trim().to_string()));
    }

    if let Some(ids) = subject_ids {
        replace_subjects(&txn, tutor_id, &ids).await?;
    }
    if let Some(ids) = grade_ids {
        replace_grades(&txn, tutor_id, &ids).await?;
    }

    if let Some(step) = onboarding::step_for_update(has_identity, has_teaching_info) {
        let just_completed = progress.complete(step);
        apply_progress(&mut active, &progress, just_completed);
    }

    active.updated_at = Set(Utc::now().fixed_offset());
    let updated = active
        .update(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Tutor profile updated successfully.",
        tutor_response(&state.db, &updated).await?,
    )))
}

async fn resolve_subject_codes(
    db: &DatabaseConnection,
    codes: &[String],
) -> Result<Vec<Uuid>, AppError> {
    let rows = subject::Entity::find()
        .filter(subject::Column::Code.is_in(codes.to_vec()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if rows.len() != codes.len() {
        return Err(AppError::BadRequest(
            "One or more subject codes are unknown.".to_string(),
        ));
    }
    Ok(rows.into_iter().map(|s| s.id).collect())
}

async fn resolve_grade_codes(
    db: &DatabaseConnection,
    codes: &[String],
) -> Result<Vec<Uuid>, AppError> {
    let rows = grade::Entity::find()
        .filter(grade::Column::Code.is_in(codes.to_vec()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if rows.len() != codes.len() {
        return Err(AppError::BadRequest(
            "One or more grade codes are unknown.".to_string(),
        ));
    }
    Ok(rows.into_iter().map(|g| g.id).collect())
}

async fn replace_subjects<C: ConnectionTrait>(
    db: &C,
    tutor_id: Uuid,
    subject_ids: &[Uuid],
) -> Result<(), AppError> {
    tutor_subject::Entity::delete_many()
        .filter(tutor_subject::Column::TutorId.eq(tutor_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    for subject_id in subject_ids {
        let row = tutor_subject::ActiveModel {
            tutor_id: Set(tutor_id),
            subject_id: Set(*subject_id),
        };
        row.insert(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    }
    Ok(())
}

async fn replace_grades<C: ConnectionTrait>(
    db: &C,
    tutor_id: Uuid,
    grade_ids: &[Uuid],
) -> Result<(), AppError> {
    tutor_grade::Entity::delete_many()
        .filter(tutor_grade::Column::TutorId.eq(tutor_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    for grade_id in grade_ids {
        let row = tutor_grade::ActiveModel {
            tutor_id: Set(tutor_id),
            grade_id: Set(*grade_id),
        };
        row.insert(db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    }
    Ok(())
}

/// `GET /api/v1/tutors/profile` — own profile via token or `?email=`.
async fn get_own_profile(
    State(state): State<AppState>,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ApiResponse<TutorResponse>>, AppError> {
    let acting = resolve_acting_user(&state.db, maybe_user, query.email.as_deref()).await?;
    let tutor_model = require_own_tutor(&state.db, acting.id).await?;

    Ok(Json(ApiResponse::ok(
        "Tutor profile retrieved successfully.",
        tutor_response(&state.db, &tutor_model).await?,
    )))
}

/// `GET /api/v1/tutors/profile/progress` — bearer auth.
async fn get_progress(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
) -> Result<Json<ApiResponse<ProgressResponse>>, AppError> {
    let tutor_model = require_own_tutor(&state.db, acting.id).await?;

    Ok(Json(ApiResponse::ok(
        "Onboarding progress retrieved successfully.",
        ProgressResponse {
            current_step: tutor_model.current_step,
            completed_steps: onboarding::steps_from_json(&tutor_model.completed_steps),
            is_profile_complete: tutor_model.is_profile_complete,
            profile_status: tutor_model.profile_status,
        },
    )))
}

/// `GET /api/v1/tutors/profile/{user_id}` — public lookup by owning user.
async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TutorResponse>>, AppError> {
    let tutor_model = find_tutor_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tutor profile not found.".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "Tutor profile retrieved successfully.",
        tutor_response(&state.db, &tutor_model).await?,
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Onboarding: certificates
// ─────────────────────────────────────────────────────────────────────────────

struct CertificateUpload {
    school_name: Option<String>,
    major: Option<String>,
    education_status: Option<String>,
    email: Option<String>,
    images: Vec<(String, Vec<u8>)>,
}

async fn read_certificate_multipart(
    mut multipart: Multipart,
) -> Result<CertificateUpload, AppError> {
    let mut upload = CertificateUpload {
        school_name: None,
        major: None,
        education_status: None,
        email: None,
        images: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "images" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                storage::validate_image(&file_name, data.len())?;
                upload.images.push((file_name, data.to_vec()));
            }
            "schoolName" => {
                upload.school_name = Some(read_text_field(field).await?);
            }
            "major" => {
                upload.major = Some(read_text_field(field).await?);
            }
            "educationStatus" => {
                upload.education_status = Some(read_text_field(field).await?);
            }
            "email" => {
                upload.email = Some(read_text_field(field).await?);
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart field: {e}")))
}

/// `POST /api/v1/tutors/certificates` — onboarding step 3, multipart.
///
/// The certificate insert and the step-3 progress update share one
/// transaction; stored images are cleaned up if the transaction fails.
async fn create_certificate(
    State(state): State<AppState>,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_certificate_multipart(multipart).await?;

    let acting = resolve_acting_user(&state.db, maybe_user, upload.email.as_deref()).await?;
    let tutor_model = require_own_tutor(&state.db, acting.id).await?;

    let school_name = upload
        .school_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("School name is required.".to_string()))?;
    let major = upload
        .major
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Major is required.".to_string()))?;
    let education_status = upload
        .education_status
        .ok_or_else(|| AppError::BadRequest("Education status is required.".to_string()))?;
    validate_education_status(&education_status)?;

    if upload.images.is_empty() {
        return Err(AppError::BadRequest(
            "At least one certificate image is required.".to_string(),
        ));
    }

    let mut stored_urls = Vec::with_capacity(upload.images.len());
    for (file_name, data) in &upload.images {
        match storage::save_image(&state.config.upload_dir, CERTIFICATE_FOLDER, file_name, data)
            .await
        {
            Ok(url) => stored_urls.push(url),
            Err(e) => {
                storage::delete_images(&state.config.upload_dir, &stored_urls).await;
                return Err(e);
            }
        }
    }

    let result = insert_certificate_txn(
        &state.db,
        &tutor_model,
        &school_name,
        &major,
        &education_status,
        &stored_urls,
    )
    .await;

    match result {
        Ok(certificate_model) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(
                "Certificate created successfully.",
                certificate_model,
            )),
        )
            .into_response()),
        Err(e) => {
            storage::delete_images(&state.config.upload_dir, &stored_urls).await;
            Err(e)
        }
    }
}

async fn insert_certificate_txn(
    db: &DatabaseConnection,
    tutor_model: &tutor::Model,
    school_name: &str,
    major: &str,
    education_status: &str,
    image_urls: &[String],
) -> Result<certificate::Model, AppError> {
    let txn = db.begin().await.map_err(|e| AppError::Internal(e.into()))?;

    let now = Utc::now().fixed_offset();
    let new_certificate = certificate::ActiveModel {
        id: Set(Uuid::new_v4()),
        tutor_id: Set(tutor_model.id),
        school_name: Set(school_name.trim().to_string()),
        major: Set(major.trim().to_string()),
        education_status: Set(education_status.to_string()),
        images: Set(Value::from(image_urls.to_vec())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let certificate_model = new_certificate
        .insert(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut progress = Progress::from_parts(
        tutor_model.current_step,
        &tutor_model.completed_steps,
        tutor_model.is_profile_complete,
    );
    let just_completed = progress.complete(onboarding::STEP_CERTIFICATE);

    let mut active: tutor::ActiveModel = tutor_model.clone().into();
    apply_progress(&mut active, &progress, just_completed);
    active.updated_at = Set(now);
    active
        .update(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(certificate_model)
}

/// `GET /api/v1/tutors/certificates` — own certificates.
async fn list_certificates(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
) -> Result<Json<ApiResponse<Vec<certificate::Model>>>, AppError> {
    let tutor_model = require_own_tutor(&state.db, acting.id).await?;

    let certificates = tutor_model
        .find_related(certificate::Entity)
        .order_by_desc(certificate::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Certificates retrieved successfully.",
        certificates,
    )))
}

async fn require_owned_certificate(
    db: &DatabaseConnection,
    user_id: Uuid,
    certificate_id: Uuid,
) -> Result<(tutor::Model, certificate::Model), AppError> {
    let certificate_model = certificate::Entity::find_by_id(certificate_id)
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Certificate not found.".to_string()))?;

    let tutor_model = require_own_tutor(db, user_id).await?;
    if certificate_model.tutor_id != tutor_model.id {
        return Err(AppError::Forbidden(
            "You can only manage your own certificates.".to_string(),
        ));
    }

    Ok((tutor_model, certificate_model))
}

/// `PUT /api/v1/tutors/certificates/{id}` — owner only; merges new images.
async fn update_certificate(
    State(state): State<AppState>,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<certificate::Model>>, AppError> {
    let upload = read_certificate_multipart(multipart).await?;

    let acting = resolve_acting_user(&state.db, maybe_user, upload.email.as_deref()).await?;
    let (_, certificate_model) = require_owned_certificate(&state.db, acting.id, id).await?;

    if let Some(ref status) = upload.education_status {
        validate_education_status(status)?;
    }

    let mut stored_urls = Vec::with_capacity(upload.images.len());
    for (file_name, data) in &upload.images {
        match storage::save_image(&state.config.upload_dir, CERTIFICATE_FOLDER, file_name, data)
            .await
        {
            Ok(url) => stored_urls.push(url),
            Err(e) => {
                storage::delete_images(&state.config.upload_dir, &stored_urls).await;
                return Err(e);
            }
        }
    }

    let mut merged = image_urls(&certificate_model.images);
    merged.extend(stored_urls.iter().cloned());

    let mut active: certificate::ActiveModel = certificate_model.into();
    if let Some(school_name) = upload.school_name.filter(|s| !s.trim().is_empty()) {
        active.school_name = Set(school_name.trim().to_string());
    }
    if let Some(major) = upload.major.filter(|s| !s.trim().is_empty()) {
        active.major = Set(major.trim().to_string());
    }
    if let Some(status) = upload.education_status {
        active.education_status = Set(status);
    }
    active.images = Set(Value::from(merged));
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = match active.update(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            storage::delete_images(&state.config.upload_dir, &stored_urls).await;
            return Err(AppError::Internal(e.into()));
        }
    };

    Ok(Json(ApiResponse::ok(
        "Certificate updated successfully.",
        updated,
    )))
}

/// `DELETE /api/v1/tutors/certificates/{id}` — owner only.
async fn delete_certificate(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let (_, certificate_model) = require_owned_certificate(&state.db, acting.id, id).await?;

    // Stored files go first; a half-deleted row is worse than an orphan file
    let urls = image_urls(&certificate_model.images);
    storage::delete_images(&state.config.upload_dir, &urls).await;

    certificate_model
        .delete(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::message("Certificate deleted successfully.")))
}

/// `DELETE /api/v1/tutors/certificates/{id}/images` — remove named images.
async fn delete_certificate_images(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DeleteImagesRequest>,
) -> Result<Json<ApiResponse<certificate::Model>>, AppError> {
    let (_, certificate_model) = require_owned_certificate(&state.db, acting.id, id).await?;

    let existing = image_urls(&certificate_model.images);
    let removing: Vec<String> = existing
        .iter()
        .filter(|url| body.images.contains(url))
        .cloned()
        .collect();

    if removing.is_empty() {
        return Err(AppError::BadRequest(
            "None of the given images belong to this certificate.".to_string(),
        ));
    }

    storage::delete_images(&state.config.upload_dir, &removing).await;

    let remaining: Vec<String> = existing
        .into_iter()
        .filter(|url| !removing.contains(url))
        .collect();

    let mut active: certificate::ActiveModel = certificate_model.into();
    active.images = Set(Value::from(remaining));
    active.updated_at = Set(Utc::now().fixed_offset());
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(
        "Certificate images removed successfully.",
        updated,
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Feedback
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/tutors/{id}/feedbacks` — visible feedback, paginated.
async fn list_feedbacks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<FeedbackResponse>>>, AppError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);

    let paginator = feedback::Entity::find()
        .filter(feedback::Column::TutorId.eq(id))
        .filter(feedback::Column::Status.eq("visible"))
        .order_by_desc(feedback::Column::CreatedAt)
        .paginate(&state.db, limit);

    let total = paginator
        .num_items()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let rows = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let items = resolve_feedback_authors(&state.db, rows).await?;
    Ok(Json(ApiResponse::ok(
        "Feedback retrieved successfully.",
        Paginated::new(items, page, limit, total),
    )))
}

/// Resolve author display names from the student or parent profile behind
/// each feedback row.
async fn resolve_feedback_authors(
    db: &DatabaseConnection,
    rows: Vec<feedback::Model>,
) -> Result<Vec<FeedbackResponse>, AppError> {
    let author_ids: Vec<Uuid> = rows.iter().map(|r| r.author_user_id).collect();

    let students = student::Entity::find()
        .filter(student::Column::UserId.is_in(author_ids.clone()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let parents = parent::Entity::find()
        .filter(parent::Column::UserId.is_in(author_ids))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let student_names: std::collections::HashMap<Uuid, String> = students
        .into_iter()
        .map(|s| (s.user_id, s.full_name))
        .collect();
    let parent_names: std::collections::HashMap<Uuid, String> = parents
        .into_iter()
        .map(|p| (p.user_id, p.full_name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|r| {
            let author_name = match r.author_role.as_str() {
                "parent" => parent_names.get(&r.author_user_id),
                _ => student_names.get(&r.author_user_id),
            }
            .cloned()
            .unwrap_or_else(|| "Anonymous".to_string());

            FeedbackResponse {
                id: r.id,
                rating: r.rating,
                comment: r.comment,
                author_role: r.author_role,
                author_name,
                created_at: r.created_at.to_rfc3339(),
            }
        })
        .collect())
}

/// `POST /api/v1/tutors/{id}/feedbacks` — bearer auth, one per author.
///
/// The insert and the rating recalculation share one transaction.
async fn create_feedback(
    State(state): State<AppState>,
    AuthUser(acting): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateFeedbackRequest>,
) -> Result<Response, AppError> {
    if acting.role != "student" && acting.role != "parent" {
        return Err(AppError::Forbidden(
            "Only students and parents can leave feedback.".to_string(),
        ));
    }

    if !(1..=5).contains(&body.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5.".to_string(),
        ));
    }

    let tutor_model = tutor::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .filter(|t| t.profile_status == "approved" && t.is_profile_complete)
        .ok_or_else(|| AppError::NotFound("Tutor not found.".to_string()))?;

    let existing = feedback::Entity::find()
        .filter(feedback::Column::TutorId.eq(tutor_model.id))
        .filter(feedback::Column::AuthorUserId.eq(acting.id))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already left feedback for this tutor.".to_string(),
        ));
    }

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let now = Utc::now().fixed_offset();
    let new_feedback = feedback::ActiveModel {
        id: Set(Uuid::new_v4()),
        tutor_id: Set(tutor_model.id),
        author_user_id: Set(acting.id),
        author_role: Set(acting.role.clone()),
        rating: Set(body.rating),
        comment: Set(body.comment.filter(|c| !c.trim().is_empty())),
        status: Set("visible".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let feedback_model = new_feedback
        .insert(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let (average, count) = calculate_average_rating(&txn, tutor_model.id).await?;
    let mut active: tutor::ActiveModel = tutor_model.into();
    active.average_rating = Set(average);
    active.total_feedback = Set(count);
    active.updated_at = Set(now);
    active
        .update(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Feedback submitted successfully.",
            feedback_model,
        )),
    )
        .into_response())
}
