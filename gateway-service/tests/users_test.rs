mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp, COO_EMAIL};
use gateway_service::services::UserDirectory;
use serde_json::json;
use uuid::Uuid;

async fn user_id(app: &TestApp, email: &str) -> Uuid {
    app.directory
        .find_by_email(email)
        .await
        .unwrap()
        .unwrap()
        .user_id
}

#[tokio::test]
async fn test_admin_assigns_role_and_facilities() {
    let app = TestApp::spawn();
    let admin = app.sign_in(COO_EMAIL).await;
    app.sign_in("field.tech@hylur.net").await;
    let id = user_id(&app, "field.tech@hylur.net").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}", id),
            Some(&admin),
            Some(json!({ "role": "CLIENT_USER", "facilityIds": "f2, f1,," })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["role"], "CLIENT_USER");
    assert_eq!(body["facilityIds"], json!(["f1", "f2"]));
    assert_eq!(body["isActive"], true);

    // The next session carries the assignment.
    let token = app.sign_in("field.tech@hylur.net").await;
    let session = body_json(app.get("/api/auth/session", Some(&token)).await).await;
    assert_eq!(session["facilityIds"], json!(["f1", "f2"]));
}

#[tokio::test]
async fn test_update_requires_user_management() {
    let app = TestApp::spawn();
    let guest = app.sign_in("field.tech@hylur.net").await;
    let id = user_id(&app, "field.tech@hylur.net").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}", id),
            Some(&guest),
            Some(json!({ "role": "CEO" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["required"], json!(["user_management"]));
    assert_eq!(body["userRole"], "GUEST");
}

#[tokio::test]
async fn test_empty_update_is_rejected() {
    let app = TestApp::spawn();
    let admin = app.sign_in(COO_EMAIL).await;
    let id = user_id(&app, COO_EMAIL).await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}", id),
            Some(&admin),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::spawn();
    let admin = app.sign_in(COO_EMAIL).await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}", Uuid::new_v4()),
            Some(&admin),
            Some(json!({ "isActive": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
