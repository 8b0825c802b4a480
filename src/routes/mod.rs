mod auth;
mod grades;
mod health;
mod parents;
mod students;
mod subjects;
mod tutors;
mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — lightweight liveness check
/// - `/api/v1/...` — versioned API surface (auth, users, tutors, students,
///   parents, subjects, grades)
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .merge(health::api_router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/tutors", tutors::router())
        .nest("/students", students::router())
        .nest("/parents", parents::router())
        .nest("/subjects", subjects::router())
        .nest("/grades", grades::router());

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
}
