use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use tutorlink_api::config::{Config, Environment};
use tutorlink_api::state::AppState;

/// Build the app over an in-memory SQLite database with all migrations
/// applied. The connection is returned alongside the router so tests can
/// inspect rows the API does not expose (e.g. OTP codes).
pub async fn test_app() -> (Router, DatabaseConnection) {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let state = AppState {
        db: db.clone(),
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_secs: 86_400,
            frontend_url: "http://localhost:3001".to_string(),
            upload_dir: "test_uploads".to_string(),
        },
    };

    (tutorlink_api::routes::router().with_state(state), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    send(app, request).await
}

/// GET with a bearer token.
pub async fn get_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap_or_default();

    send(app, request).await
}

/// POST a JSON body.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// POST a JSON body with a bearer token.
pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// PUT a JSON body, optionally with a bearer token.
pub async fn put_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .unwrap_or_default();

    send(app, request).await
}

/// DELETE with a bearer token and optional JSON body.
pub async fn delete_auth(
    app: &Router,
    uri: &str,
    body: Option<&serde_json::Value>,
    token: &str,
) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    let request = if let Some(body) = body {
        builder = builder.header("content-type", "application/json");
        builder.body(Body::from(body.to_string())).unwrap_or_default()
    } else {
        builder.body(Body::empty()).unwrap_or_default()
    };

    send(app, request).await
}

/// Build a `multipart/form-data` body from text fields and file parts.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, file_name, data) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// POST a multipart body, optionally with a bearer token.
pub async fn post_multipart(
    app: &Router,
    uri: &str,
    boundary: &str,
    body: Vec<u8>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body)).unwrap_or_default();

    send(app, request).await
}

/// Read the most recent OTP code issued for an email.
pub async fn latest_otp_code(db: &DatabaseConnection, email: &str) -> String {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
    use tutorlink_api::entities::otp;

    otp::Entity::find()
        .filter(otp::Column::Email.eq(email))
        .order_by_desc(otp::Column::CreatedAt)
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|r| r.code)
        .unwrap_or_default()
}

/// Register an account through the OTP flow and return its login token.
pub async fn register_and_login(
    app: &Router,
    db: &DatabaseConnection,
    email: &str,
    role: &str,
) -> String {
    let (status, body) = post_json(
        app,
        "/api/v1/users/register",
        &serde_json::json!({
            "email": email,
            "password": "secret123",
            "phone": "0912345678",
            "role": role,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");

    let code = latest_otp_code(db, email).await;
    let (status, body) = post_json(
        app,
        "/api/v1/users/verify-otp",
        &serde_json::json!({ "email": email, "otp": code }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "verify-otp failed: {body}");

    let (status, body) = post_json(
        app,
        "/api/v1/auth/login",
        &serde_json::json!({ "email": email, "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    json["data"]["token"].as_str().unwrap_or_default().to_string()
}
