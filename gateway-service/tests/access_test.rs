mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_json, location, test_config, TestApp, CEO_EMAIL, COO_EMAIL};
use gateway_service::{
    config::DefaultPolicy,
    models::{Facility, NewFacility, Role, UserUpdate},
};
use serde_json::json;

fn seed(app: &TestApp, id: &str, status: &str) {
    let mut facility = Facility::from_new(NewFacility {
        name: format!("Facility {}", id),
        location: "Reykjavik, Iceland".to_string(),
        capacity: 10.5,
        client_id: None,
    });
    facility.id = id.to_string();
    facility.status = status.to_string();
    app.facilities.seed(facility);
}

fn seed_all(app: &TestApp) {
    seed(app, "f1", "active");
    seed(app, "f2", "active");
    seed(app, "f3", "retired");
}

fn ids(body: &serde_json::Value) -> Vec<String> {
    let mut ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_client_user_sees_only_assigned_facilities() {
    let app = TestApp::spawn();
    seed_all(&app);

    let token = app
        .sign_in_as("field.tech@hylur.net", Role::ClientUser, &["f1"])
        .await;
    let response = app.get("/api/facilities", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(ids(&body), vec!["f1"]);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "CLIENT_USER");
    assert_eq!(body["user"]["facilityCount"], 1);
}

#[tokio::test]
async fn test_client_user_without_assignments_sees_nothing() {
    let app = TestApp::spawn();
    seed_all(&app);

    let token = app
        .sign_in_as("field.tech@hylur.net", Role::ClientUser, &[])
        .await;
    let body = body_json(app.get("/api/facilities", Some(&token)).await).await;
    assert!(ids(&body).is_empty());
    assert_eq!(body["user"]["facilityCount"], 0);
}

#[tokio::test]
async fn test_executive_sees_every_facility_regardless_of_assignment() {
    let app = TestApp::spawn();
    seed_all(&app);

    let token = app.sign_in(COO_EMAIL).await;
    let body = body_json(app.get("/api/facilities", Some(&token)).await).await;
    assert_eq!(ids(&body), vec!["f1", "f2", "f3"]);
}

#[tokio::test]
async fn test_client_admin_sees_active_facilities() {
    let app = TestApp::spawn();
    seed_all(&app);

    let token = app
        .sign_in_as("site.admin@hylur.net", Role::ClientAdmin, &[])
        .await;
    let body = body_json(app.get("/api/facilities", Some(&token)).await).await;
    assert_eq!(ids(&body), vec!["f1", "f2"]);
}

#[tokio::test]
async fn test_listing_requires_a_session() {
    let app = TestApp::spawn();

    let response = app.get("/api/facilities", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "unauthenticated");
}

#[tokio::test]
async fn test_create_facility_needs_manage_all_facilities() {
    let app = TestApp::spawn();
    let payload = json!({
        "name": "Hylur Demo BESS Facility",
        "location": "Reykjavik, Iceland",
        "capacity": 10.5
    });

    let client = app
        .sign_in_as("field.tech@hylur.net", Role::ClientUser, &["f1"])
        .await;
    let denied = app
        .request(Method::POST, "/api/facilities", Some(&client), Some(payload.clone()))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let body = body_json(denied).await;
    assert_eq!(body["code"], "insufficient_permission");
    assert_eq!(body["required"], json!(["manage_all_facilities"]));
    assert_eq!(body["userRole"], "CLIENT_USER");

    let ceo = app.sign_in(CEO_EMAIL).await;
    let created = app
        .request(Method::POST, "/api/facilities", Some(&ceo), Some(payload))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_json(created).await;
    assert_eq!(body["status"], "active");
    assert_eq!(body["capacity"], 10.5);
}

#[tokio::test]
async fn test_create_facility_validates_input() {
    let app = TestApp::spawn();
    let ceo = app.sign_in(CEO_EMAIL).await;

    let response = app
        .request(
            Method::POST,
            "/api/facilities",
            Some(&ceo),
            Some(json!({ "name": "", "location": "Oslo", "capacity": -1.0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_other_methods_on_facilities_are_not_allowed() {
    let app = TestApp::spawn();
    let ceo = app.sign_in(CEO_EMAIL).await;

    let response = app
        .request(Method::DELETE, "/api/facilities", Some(&ceo), None)
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, POST");
}

#[tokio::test]
async fn test_anonymous_page_request_redirects_to_login_with_callback() {
    let app = TestApp::spawn();

    let response = app.get("/admin/users?tab=2", None).await;
    assert_eq!(
        location(&response),
        "/login?callbackUrl=%2Fadmin%2Fusers%3Ftab%3D2"
    );

    let public = app.get("/login", None).await;
    assert_eq!(public.status(), StatusCode::OK);
    assert_eq!(body_json(public).await["signInUrl"], "/auth/google");
}

#[tokio::test]
async fn test_login_notice_forwards_the_return_target() {
    let app = TestApp::spawn();

    let redirect = app.get("/admin/users?tab=2", None).await;
    let login = app.get(location(&redirect), None).await;
    assert_eq!(login.status(), StatusCode::OK);
    assert_eq!(
        body_json(login).await["signInUrl"],
        "/auth/google?callbackUrl=%2Fadmin%2Fusers%3Ftab%3D2"
    );

    let foreign = app
        .get("/login?callbackUrl=https%3A%2F%2Fevil.example%2F", None)
        .await;
    assert_eq!(body_json(foreign).await["signInUrl"], "/auth/google");
}

#[tokio::test]
async fn test_client_admin_is_sent_to_unauthorized_notice() {
    let app = TestApp::spawn();
    let token = app
        .sign_in_as("site.admin@hylur.net", Role::ClientAdmin, &[])
        .await;

    for path in ["/admin", "/sales/q3", "/diagnostics"] {
        let response = app.get(path, Some(&token)).await;
        assert_eq!(location(&response), "/unauthorized", "{path}");
    }

    let session = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(session.status(), StatusCode::OK);
    assert_eq!(body_json(session).await["role"], "CLIENT_ADMIN");
}

#[tokio::test]
async fn test_executive_passes_route_groups() {
    let app = TestApp::spawn();
    let token = app.sign_in(CEO_EMAIL).await;

    // No page is mounted under /admin, so the engine letting it through
    // shows up as the catch-all 404 instead of a redirect.
    let response = app.get("/admin", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unmatched_page_follows_default_policy() {
    let allow = TestApp::spawn();
    let token = allow.sign_in("new.person@hylur.net").await;
    let response = allow.get("/dashboard", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "GUEST");

    let deny = TestApp::with_config(test_config(DefaultPolicy::Deny));
    let token = deny.sign_in("new.person@hylur.net").await;
    let response = deny.get("/dashboard", Some(&token)).await;
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn test_api_paths_are_not_redirected() {
    let app = TestApp::spawn();
    let response = app.get("/api/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivation_ends_live_sessions() {
    let app = TestApp::spawn();
    let token = app.sign_in("leaver@hylur.net").await;
    let api_token = app.sign_in("leaver@hylur.net").await;

    app.set_user(
        "leaver@hylur.net",
        UserUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await;

    let page = app.get("/dashboard", Some(&token)).await;
    assert_eq!(location(&page), "/auth/inactive");

    let api = app.get("/api/facilities", Some(&api_token)).await;
    assert_eq!(api.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(api).await["code"], "account_inactive");

    // The first inactive sighting deletes the session.
    let again = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_expired_session_is_treated_as_anonymous() {
    let mut config = test_config(DefaultPolicy::Allow);
    config.session.max_age_hours = 0;
    let app = TestApp::with_config(config);

    let token = app.sign_in("new.person@hylur.net").await;
    let response = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.sessions.is_empty());

    let page = app.get("/dashboard", Some(&token)).await;
    assert_eq!(location(&page), "/login?callbackUrl=%2Fdashboard");
}

#[tokio::test]
async fn test_oversized_session_lifetime_is_rejected_and_clamped() {
    let mut config = test_config(DefaultPolicy::Allow);
    assert!(config.validate().is_ok());
    config.session.max_age_hours = i64::MAX;
    assert!(config.validate().is_err());

    let app = TestApp::with_config(config);
    let token = app.sign_in("new.person@hylur.net").await;
    let response = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_directory_outage_fails_closed() {
    let app = TestApp::spawn();
    let token = app.sign_in(CEO_EMAIL).await;
    app.directory.set_unavailable(true);

    for path in ["/api/auth/session", "/api/facilities", "/dashboard"] {
        let response = app.get(path, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
        assert_eq!(response.headers()[header::RETRY_AFTER], "5");
    }
}
