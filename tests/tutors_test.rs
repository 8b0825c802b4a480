mod common;

use axum::Router;
use axum::http::StatusCode;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;

use tutorlink_api::entities::tutor;

// Smallest valid PNG header; the server only checks extension and size.
const FAKE_PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

async fn create_tutor_profile(app: &Router, token: &str) -> serde_json::Value {
    let (status, body) = common::post_json_auth(
        app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Minh Nguyen",
            "dateOfBirth": "1992-09-15",
            "gender": "male",
            "hourlyRate": 30.0,
            "teachingArea": "District 1",
        }),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create profile failed: {body}");
    serde_json::from_str(&body).unwrap_or_default()
}

async fn upload_certificate(app: &Router, token: &str) -> (StatusCode, String) {
    let boundary = "test-boundary-7291";
    let body = common::multipart_body(
        boundary,
        &[
            ("schoolName", "HCMC University of Science"),
            ("major", "Mathematics"),
            ("educationStatus", "graduated"),
        ],
        &[("images", "diploma.png", FAKE_PNG)],
    );
    common::post_multipart(app, "/api/v1/tutors/certificates", boundary, body, Some(token)).await
}

async fn approve_tutor(db: &DatabaseConnection, full_name: &str) {
    let tutor_model = tutor::Entity::find()
        .filter(tutor::Column::FullName.eq(full_name))
        .one(db)
        .await
        .unwrap_or_default();
    if let Some(t) = tutor_model {
        let mut active: tutor::ActiveModel = t.into();
        active.profile_status = Set("approved".to_string());
        let _ = active.update(db).await;
    }
}

/// Walks the full 4-step wizard and checks every transition the clients
/// depend on.
#[tokio::test]
async fn onboarding_wizard_end_to_end() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "minh@example.com", "tutor").await;

    // Step 1: create profile
    let created = create_tutor_profile(&app, &token).await;
    assert_eq!(created["data"]["currentStep"], 2);
    assert_eq!(created["data"]["completedSteps"], json!([1]));
    assert_eq!(created["data"]["profileStatus"], "draft");
    assert_eq!(created["data"]["isProfileComplete"], false);
    // Identity numbers never serialize
    assert!(created["data"].get("identityNumber").is_none());

    // Step 2: identity number
    let (status, body) = common::put_json(
        &app,
        "/api/v1/tutors/profile",
        &json!({ "identityNumber": "079123456789" }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "identity update failed: {body}");
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["currentStep"], 3);
    assert_eq!(json_body["data"]["completedSteps"], json!([1, 2]));

    // Step 3: certificate upload
    let (status, body) = upload_certificate(&app, &token).await;
    assert_eq!(status, StatusCode::CREATED, "certificate failed: {body}");

    let (status, body) = common::get_auth(&app, "/api/v1/tutors/profile/progress", &token).await;
    assert_eq!(status, StatusCode::OK);
    let progress: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(progress["data"]["currentStep"], 4);
    assert_eq!(progress["data"]["completedSteps"], json!([1, 2, 3]));
    assert_eq!(progress["data"]["isProfileComplete"], false);

    // Step 4: teaching info completes the profile and submits it
    let (status, body) = common::put_json(
        &app,
        "/api/v1/tutors/profile",
        &json!({ "subjects": ["math", "physics"], "grades": ["grade_10", "grade_11"] }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "teaching info failed: {body}");
    let done: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(done["data"]["currentStep"], 4);
    assert_eq!(done["data"]["completedSteps"], json!([1, 2, 3, 4]));
    assert_eq!(done["data"]["isProfileComplete"], true);
    assert_eq!(done["data"]["profileStatus"], "submitted");

    let subjects = done["data"]["subjects"].as_array().cloned().unwrap_or_default();
    assert_eq!(subjects.len(), 2);
}

#[tokio::test]
async fn profile_creation_conflicts_on_second_attempt() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "linh@example.com", "tutor").await;
    create_tutor_profile(&app, &token).await;

    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Linh Le",
            "dateOfBirth": "1990-01-01",
            "gender": "female",
            "hourlyRate": 20.0,
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn non_tutor_cannot_create_tutor_profile() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "sam@example.com", "student").await;

    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Sam Student",
            "dateOfBirth": "2005-01-01",
            "gender": "male",
            "hourlyRate": 10.0,
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// The flexible contract: no token, identified by the email field instead.
#[tokio::test]
async fn onboarding_works_with_email_instead_of_token() {
    let (app, db) = common::test_app().await;
    common::register_and_login(&app, &db, "ngoc@example.com", "tutor").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "email": "ngoc@example.com",
            "fullName": "Ngoc Pham",
            "dateOfBirth": "1993-06-20",
            "gender": "female",
            "hourlyRate": 28.5,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "email-identified create failed: {body}");

    let (status, body) =
        common::get(&app, "/api/v1/tutors/profile?email=ngoc@example.com").await;
    assert_eq!(status, StatusCode::OK, "email-identified get failed: {body}");
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["fullName"], "Ngoc Pham");

    // Neither token nor email: rejected
    let (status, _) = common::get(&app, "/api/v1/tutors/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_catalog_codes_are_rejected() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "tuan@example.com", "tutor").await;
    create_tutor_profile(&app, &token).await;

    let (status, _) = common::put_json(
        &app,
        "/api/v1/tutors/profile",
        &json!({ "subjects": ["alchemy"] }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn onboard_complete_tutor(
    app: &Router,
    db: &DatabaseConnection,
    email: &str,
    full_name: &str,
    subjects: &[&str],
) -> String {
    let token = common::register_and_login(app, db, email, "tutor").await;

    let (status, body) = common::post_json_auth(
        app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": full_name,
            "dateOfBirth": "1991-02-03",
            "gender": "other",
            "hourlyRate": 22.0,
            "teachingArea": "Hanoi",
        }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "profile failed: {body}");

    let (status, _) = common::put_json(
        app,
        "/api/v1/tutors/profile",
        &json!({ "identityNumber": "001234567890" }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = upload_certificate(app, &token).await;
    assert_eq!(status, StatusCode::CREATED, "certificate failed: {body}");

    let (status, _) = common::put_json(
        app,
        "/api/v1/tutors/profile",
        &json!({ "subjects": subjects, "grades": ["grade_12"] }),
        Some(token.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    token
}

#[tokio::test]
async fn search_only_surfaces_approved_complete_profiles() {
    let (app, db) = common::test_app().await;
    onboard_complete_tutor(&app, &db, "hidden@example.com", "Hidden Tutor", &["math"]).await;

    // Submitted but not yet approved: invisible
    let (status, body) = common::get(&app, "/api/v1/tutors/search").await;
    assert_eq!(status, StatusCode::OK);
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["total"], 0);

    approve_tutor(&db, "Hidden Tutor").await;

    let (_, body) = common::get(&app, "/api/v1/tutors/search").await;
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["total"], 1);
    assert_eq!(json_body["data"]["items"][0]["fullName"], "Hidden Tutor");
}

#[tokio::test]
async fn search_filters_by_name_and_subject() {
    let (app, db) = common::test_app().await;
    onboard_complete_tutor(&app, &db, "anna@example.com", "Anna Mathers", &["math"]).await;
    onboard_complete_tutor(&app, &db, "ben@example.com", "Ben Historian", &["history"]).await;
    approve_tutor(&db, "Anna Mathers").await;
    approve_tutor(&db, "Ben Historian").await;

    // Case-insensitive name substring
    let (_, body) = common::get(&app, "/api/v1/tutors/search?name=anna").await;
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["total"], 1);
    assert_eq!(json_body["data"]["items"][0]["fullName"], "Anna Mathers");

    // Subject code filter
    let (_, body) = common::get(&app, "/api/v1/tutors/search?subjects=history").await;
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["total"], 1);
    assert_eq!(json_body["data"]["items"][0]["fullName"], "Ben Historian");

    // No match
    let (_, body) = common::get(&app, "/api/v1/tutors/search?subjects=biology").await;
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["total"], 0);
}

#[tokio::test]
async fn detail_hides_unapproved_tutors() {
    let (app, db) = common::test_app().await;
    onboard_complete_tutor(&app, &db, "duc@example.com", "Duc Vo", &["math"]).await;

    let tutor_model = tutor::Entity::find()
        .filter(tutor::Column::FullName.eq("Duc Vo"))
        .one(&db)
        .await
        .unwrap_or_default();
    let tutor_id = tutor_model.map(|t| t.id.to_string()).unwrap_or_default();

    let (status, _) = common::get(&app, &format!("/api/v1/tutors/{tutor_id}/detail")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    approve_tutor(&db, "Duc Vo").await;

    let (status, body) = common::get(&app, &format!("/api/v1/tutors/{tutor_id}/detail")).await;
    assert_eq!(status, StatusCode::OK);
    let json_body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(json_body["data"]["fullName"], "Duc Vo");
    let certificates = json_body["data"]["certificates"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0]["schoolName"], "HCMC University of Science");
}

#[tokio::test]
async fn certificate_crud_is_owner_scoped() {
    let (app, db) = common::test_app().await;
    let owner = common::register_and_login(&app, &db, "owner@example.com", "tutor").await;
    create_tutor_profile(&app, &owner).await;
    let (status, body) = upload_certificate(&app, &owner).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let certificate_id = created["data"]["id"].as_str().unwrap_or_default().to_string();

    // Listing shows it
    let (status, body) = common::get_auth(&app, "/api/v1/tutors/certificates", &owner).await;
    assert_eq!(status, StatusCode::OK);
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));

    // Another tutor cannot delete it
    let other = common::register_and_login(&app, &db, "other@example.com", "tutor").await;
    let (status, _) = common::post_json_auth(
        &app,
        "/api/v1/tutors/profile",
        &json!({
            "fullName": "Other Tutor",
            "dateOfBirth": "1994-05-05",
            "gender": "male",
            "hourlyRate": 15.0,
        }),
        &other,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::delete_auth(
        &app,
        &format!("/api/v1/tutors/certificates/{certificate_id}"),
        None,
        &other,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can
    let (status, _) = common::delete_auth(
        &app,
        &format!("/api/v1/tutors/certificates/{certificate_id}"),
        None,
        &owner,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::get_auth(&app, "/api/v1/tutors/certificates", &owner).await;
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn certificate_rejects_non_image_uploads() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "vinh@example.com", "tutor").await;
    create_tutor_profile(&app, &token).await;

    let boundary = "test-boundary-5150";
    let body = common::multipart_body(
        boundary,
        &[
            ("schoolName", "Some School"),
            ("major", "Physics"),
            ("educationStatus", "studying"),
        ],
        &[("images", "payload.exe", FAKE_PNG)],
    );
    let (status, _) =
        common::post_multipart(&app, "/api/v1/tutors/certificates", boundary, body, Some(token.as_str()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn certificate_accepts_multi_megabyte_images() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "big@example.com", "tutor").await;
    create_tutor_profile(&app, &token).await;

    // 3 MB: over axum's stock 2 MB body limit, under the per-image cap
    let mut data = vec![0u8; 3 * 1024 * 1024];
    data[..FAKE_PNG.len()].copy_from_slice(FAKE_PNG);

    let boundary = "test-boundary-3mb";
    let body = common::multipart_body(
        boundary,
        &[
            ("schoolName", "Big Scan University"),
            ("major", "Fine Arts"),
            ("educationStatus", "graduated"),
        ],
        &[("images", "scan.png", &data[..])],
    );
    let (status, body) =
        common::post_multipart(&app, "/api/v1/tutors/certificates", boundary, body, Some(token.as_str()))
            .await;
    assert_eq!(status, StatusCode::CREATED, "3 MB upload failed: {body}");
}

#[tokio::test]
async fn certificate_rejects_images_over_the_size_cap() {
    let (app, db) = common::test_app().await;
    let token = common::register_and_login(&app, &db, "huge@example.com", "tutor").await;
    create_tutor_profile(&app, &token).await;

    let mut data = vec![0u8; 5 * 1024 * 1024 + 1];
    data[..FAKE_PNG.len()].copy_from_slice(FAKE_PNG);

    let boundary = "test-boundary-5mb";
    let body = common::multipart_body(
        boundary,
        &[
            ("schoolName", "Big Scan University"),
            ("major", "Fine Arts"),
            ("educationStatus", "graduated"),
        ],
        &[("images", "scan.png", &data[..])],
    );
    let (status, _) =
        common::post_multipart(&app, "/api/v1/tutors/certificates", boundary, body, Some(token.as_str()))
            .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn catalog_endpoints_serve_seeded_data() {
    let (app, _db) = common::test_app().await;

    let (status, body) = common::get(&app, "/api/v1/subjects").await;
    assert_eq!(status, StatusCode::OK);
    let subjects: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(subjects["data"].as_array().map(Vec::len), Some(10));

    let (status, body) = common::get(&app, "/api/v1/subjects/search?q=math").await;
    assert_eq!(status, StatusCode::OK);
    let found: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(found["data"][0]["code"], "math");

    let (status, body) = common::get(&app, "/api/v1/grades").await;
    assert_eq!(status, StatusCode::OK);
    let grades: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let items = grades["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 12);
    assert_eq!(items[0]["code"], "grade_1");
    assert_eq!(items[11]["code"], "grade_12");
}

#[tokio::test]
async fn catalog_entries_resolve_by_id() {
    let (app, _db) = common::test_app().await;

    let (_, body) = common::get(&app, "/api/v1/subjects").await;
    let subjects: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let subject_id = subjects["data"][0]["id"].as_str().unwrap_or_default().to_string();
    let subject_code = subjects["data"][0]["code"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::get(&app, &format!("/api/v1/subjects/{subject_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let found: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(found["data"]["code"], subject_code);

    let (_, body) = common::get(&app, "/api/v1/grades").await;
    let grades: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let grade_id = grades["data"][4]["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::get(&app, &format!("/api/v1/grades/{grade_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let found: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(found["data"]["code"], "grade_5");

    // Unknown ids are a clean 404
    let missing = uuid::Uuid::new_v4();
    let (status, _) = common::get(&app, &format!("/api/v1/subjects/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::get(&app, &format!("/api/v1/grades/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
