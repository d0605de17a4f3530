//! Security tests for orchard-ar
//!
//! - Session gate on protected routes when auth is enabled
//! - 10MB request body limit

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use orchard_ar::{build_router, AppState, MAX_BODY_BYTES};
use orchard_common::analysis::{AnalysisConfig, PageGeometry};
use orchard_common::config::AuthConfig;
use orchard_common::db::init_database;
use serde_json::json;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Test helper: Create app with auth enabled
async fn setup_app_with_auth() -> (TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let db = init_database(&dir.path().join("orchard.db")).await.unwrap();
    let auth = AuthConfig {
        enabled: true,
        email: "grower@example.com".to_string(),
        password: "secret".to_string(),
    };
    let state = AppState::new(db, AnalysisConfig::default(), PageGeometry::default(), auth);
    (dir, build_router(state))
}

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": email, "password": password}).to_string(),
        ))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` part of a Set-Cookie header
fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

// =============================================================================
// Session gate
// =============================================================================

#[tokio::test]
async fn test_protected_route_requires_login() {
    let (_dir, app) = setup_app_with_auth().await;

    let response = app
        .oneshot(get_with_cookie("/api/analysis", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_stays_public() {
    let (_dir, app) = setup_app_with_auth().await;
    let response = app.oneshot(get_with_cookie("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let (_dir, app) = setup_app_with_auth().await;
    let response = app
        .oneshot(login_request("grower@example.com", "guess"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_then_access_then_logout() {
    let (_dir, app) = setup_app_with_auth().await;

    let response = app
        .clone()
        .oneshot(login_request(" Grower@Example.com ", "secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("orchard_session="));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/analysis", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logout = Request::builder()
        .method("POST")
        .uri("/api/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("orchard_session="));

    // Token is gone server-side even if the client keeps sending it
    let response = app
        .oneshot(get_with_cookie("/api/analysis", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_session_rejected() {
    let (_dir, app) = setup_app_with_auth().await;
    let forged = format!("orchard_session={}", uuid::Uuid::new_v4());
    let response = app
        .oneshot(get_with_cookie("/api/export/csv", Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Body size limit
// =============================================================================

/// Bodies over 10MB are refused before they reach the store
#[tokio::test]
async fn test_oversized_body_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = init_database(&dir.path().join("orchard.db")).await.unwrap();
    let state = AppState::new(
        db,
        AnalysisConfig::default(),
        PageGeometry::default(),
        AuthConfig::default(),
    );
    let app = build_router(state);

    let huge = "x".repeat(MAX_BODY_BYTES + 1);
    let request = Request::builder()
        .method("POST")
        .uri("/api/observations")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "payload": huge }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
