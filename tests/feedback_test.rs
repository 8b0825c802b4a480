mod common;

use axum::Router;
use axum::http::StatusCode;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;

use tutorlink_api::entities::tutor;

const FAKE_PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Onboard a tutor through all four steps and approve them directly in the
/// database, returning the tutor row id.
async fn approved_tutor(app: &Router, db: &DatabaseConnection, email: &str) -> String {
    let token = common::register_and_login(app, db, email, "tutor").await;

    let (status, _) = common::post_json_auth(
        app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Rated Tutor",
            "dateOfBirth": "1990-03-03",
            "gender": "female",
            "hourlyRate": 35.0,
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::put_json(
        app,
        "/api/v1/tutors/profile",
        &json!({ "identityNumber": "079000000001" }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let boundary = "test-boundary-9war";
    let body = common::multipart_body(
        boundary,
        &[
            ("schoolName", "Teacher College"),
            ("major", "Education"),
            ("educationStatus", "graduated"),
        ],
        &[("images", "cert.jpg", FAKE_PNG)],
    );
    let (status, _) =
        common::post_multipart(app, "/api/v1/tutors/certificates", boundary, body, Some(token.as_str()))
            .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::put_json(
        app,
        "/api/v1/tutors/profile",
        &json!({ "subjects": ["english"], "grades": ["grade_9"] }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tutor_model = tutor::Entity::find()
        .filter(tutor::Column::FullName.eq("Rated Tutor"))
        .one(db)
        .await
        .unwrap_or_default();
    assert!(tutor_model.is_some(), "tutor row missing");
    let mut id = String::new();
    if let Some(t) = tutor_model {
        id = t.id.to_string();
        let mut active: tutor::ActiveModel = t.into();
        active.profile_status = Set("approved".to_string());
        let _ = active.update(db).await;
    }
    id
}

/// A student profile so feedback can resolve the author's display name.
async fn student_with_profile(
    app: &Router,
    db: &DatabaseConnection,
    email: &str,
    name: &str,
) -> String {
    let token = common::register_and_login(app, db, email, "student").await;
    let (status, _) = common::post_json_auth(
        app,
        "/api/v1/students/profile",
        &json!({ "fullName": name }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    token
}

#[tokio::test]
async fn feedback_updates_rating_aggregate() {
    let (app, db) = common::test_app().await;
    let tutor_id = approved_tutor(&app, &db, "tutor@example.com").await;
    let alice = student_with_profile(&app, &db, "alice@example.com", "Alice An").await;
    let bob = student_with_profile(&app, &db, "bob@example.com", "Bob Binh").await;

    let (status, body) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 5, "comment": "Great teacher" }),
        &alice,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "feedback failed: {body}");

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 4 }),
        &bob,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 5 and 4 average to 4.5, already at 1-decimal precision
    let (status, body) = common::get(&app, &format!("/api/v1/tutors/{tutor_id}/detail")).await;
    assert_eq!(status, StatusCode::OK);
    let detail: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(detail["data"]["averageRating"], 4.5);
    assert_eq!(detail["data"]["totalFeedback"], 2);

    // Listing resolves author names from student profiles
    let (status, body) =
        common::get(&app, &format!("/api/v1/tutors/{tutor_id}/feedbacks")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(listed["data"]["total"], 2);
    let items = listed["data"]["items"].as_array().cloned().unwrap_or_default();
    let names: Vec<String> = items
        .iter()
        .filter_map(|i| i["authorName"].as_str().map(String::from))
        .collect();
    assert!(names.iter().any(|n| n == "Alice An"));
    assert!(names.iter().any(|n| n == "Bob Binh"));
}

#[tokio::test]
async fn duplicate_feedback_conflicts() {
    let (app, db) = common::test_app().await;
    let tutor_id = approved_tutor(&app, &db, "tutor2@example.com").await;
    let student = student_with_profile(&app, &db, "carol@example.com", "Carol Chi").await;

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 3 }),
        &student,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 5 }),
        &student,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn feedback_validates_rating_and_author_role() {
    let (app, db) = common::test_app().await;
    let tutor_id = approved_tutor(&app, &db, "tutor3@example.com").await;
    let student = student_with_profile(&app, &db, "dana@example.com", "Dana Duong").await;

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 0 }),
        &student,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 6 }),
        &student,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Tutors cannot rate tutors
    let other_tutor = common::register_and_login(&app, &db, "rival@example.com", "tutor").await;
    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{tutor_id}/feedbacks"),
        &json!({ "rating": 1 }),
        &other_tutor,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn feedback_requires_an_approved_tutor() {
    let (app, db) = common::test_app().await;
    let student = student_with_profile(&app, &db, "erin@example.com", "Erin Em").await;

    // Draft tutor: invisible to feedback
    let token = common::register_and_login(&app, &db, "draft@example.com", "tutor").await;
    let (status, body) = common::post_json_auth(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Draft Tutor",
            "dateOfBirth": "1990-01-01",
            "gender": "male",
            "hourlyRate": 12.0,
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let draft_id = created["data"]["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::post_json_auth(
        &app,
        &format!("/api/v1/tutors/{draft_id}/feedbacks"),
        &json!({ "rating": 5 }),
        &student,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
