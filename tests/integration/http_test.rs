//! Integration tests for the HTTP endpoints.

mod helpers;

use axum::http::StatusCode;

use helpers::{TestApp, id, start_jam};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health/detailed").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["store"], "connected");
    assert_eq!(response.body["data"]["ws_connections"], 0);
    assert!(response.body["data"]["metrics"].is_object());
}

#[tokio::test]
async fn test_public_jams_and_summary() {
    let app = TestApp::new();
    let code = start_jam(app.services(), &id("host")).await;

    let response = app.request("GET", "/api/jams/public").await;
    assert_eq!(response.status, StatusCode::OK);
    let jams = response.body["data"].as_array().unwrap();
    assert_eq!(jams.len(), 1);
    assert_eq!(jams[0]["code"], code.as_str());
    assert_eq!(jams[0]["name"], "Friday Mix");
    assert_eq!(jams[0]["host_nickname"], "Host");
    assert!(jams[0].get("password_hash").is_none());

    let lower = code.as_str().to_lowercase();
    let response = app.request("GET", &format!("/api/jams/{lower}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["code"], code.as_str());
    assert_eq!(response.body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_ended_jam_summary_is_inactive() {
    let app = TestApp::new();
    let host = id("host");
    let code = start_jam(app.services(), &host).await;
    app.services().lifecycle.end(&host, &code).await.unwrap();

    let response = app
        .request("GET", &format!("/api/jams/{}", code.as_str()))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["is_active"], false);

    let response = app.request("GET", "/api/jams/public").await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_jam_is_not_found() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/jams/ZZZZZZ").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_ws_upgrade_without_token_when_auth_enabled() {
    let app = TestApp::with_auth();

    let response = app.request("GET", "/ws").await;

    assert!(
        response.status == StatusCode::UNAUTHORIZED
            || response.status == StatusCode::BAD_REQUEST
            || response.status == StatusCode::UPGRADE_REQUIRED,
        "Expected 401, 400, or 426, got {}",
        response.status
    );
}
