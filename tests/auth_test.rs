mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_returns_token_and_user() {
    let (app, db) = common::test_app().await;
    common::register_and_login(&app, &db, "alice@example.com", "student").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "alice@example.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["success"], true);
    assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["data"]["user"]["email"], "alice@example.com");
    assert!(json["data"]["user"]["lastLoginAt"].as_str().is_some());
    // Students carry no onboarding block
    assert!(json["data"].get("profileStatus").is_none());
}

#[tokio::test]
async fn login_includes_tutor_onboarding_snapshot() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "tina@example.com", "tutor").await;

    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Tina Tran",
            "dateOfBirth": "1995-04-01",
            "gender": "female",
            "hourlyRate": 25.0,
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "tina@example.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["data"]["profileStatus"]["completed"], false);
    assert_eq!(json["data"]["profileStatus"]["currentStep"], 2);
    assert_eq!(json["data"]["profileStatus"]["completedSteps"], json!([1]));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (app, db) = common::test_app().await;
    common::register_and_login(&app, &db, "bob@example.com", "student").await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "bob@example.com", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "unknown@example.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "carol@example.com", "parent").await;

    let (status, _) = common::get(&app, "/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get_auth(&app, "/api/v1/auth/me", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = common::get_auth(&app, "/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json["data"]["role"], "parent");
}

#[tokio::test]
async fn change_password_round_trip() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "dave@example.com", "student").await;

    // Wrong current password
    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/auth/change-password",
        &json!({ "currentPassword": "nope", "newPassword": "brand-new-1" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reusing the current password
    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/auth/change-password",
        &json!({ "currentPassword": "secret123", "newPassword": "secret123" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/auth/change-password",
        &json!({ "currentPassword": "secret123", "newPassword": "brand-new-1" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password is dead, new one works
    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "dave@example.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "dave@example.com", "password": "brand-new-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_resets_with_otp() {
    let (app, db) = common::test_app().await;
    common::register_and_login(&app, &db, "erin@example.com", "student").await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/forgot-password",
        &json!({ "email": "erin@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = common::latest_otp_code(&db, "erin@example.com").await;
    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/reset-password",
        &json!({ "email": "erin@example.com", "otp": code, "newPassword": "reset-pass-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "reset failed: {body}");

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/login",
        &json!({ "email": "erin@example.com", "password": "reset-pass-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_registration() {
    let (app, db) = common::test_app().await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/forgot-password",
        &json!({ "email": "ghost@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No code was actually issued for the unknown address
    let code = common::latest_otp_code(&db, "ghost@example.com").await;
    assert!(code.is_empty());
}
