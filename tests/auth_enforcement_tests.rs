//! Authentication and login behaviour.
//!
//! Covers:
//! - Protected endpoints reject unauthenticated requests (401)
//! - Public endpoints allow unauthenticated access
//! - Tokens always resolve to the current database user

use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde_json::json;

mod common;
use common::{create_test_state, create_test_user_with_role, send, test_app, token_for, TEST_PASSWORD};

use cohortly::models::user::UserRole;

#[tokio::test]
async fn test_protected_endpoints_require_token() {
    let state = create_test_state().await;
    let app = test_app(&state);

    let endpoints = [
        (Method::GET, "/api/users/me"),
        (Method::GET, "/api/users"),
        (Method::GET, "/api/bootcamps"),
        (Method::GET, "/api/enrollments"),
        (Method::POST, "/api/enrollments"),
        (Method::GET, "/api/enrollments/1/progress"),
        (Method::POST, "/api/enrollments/1/milestones/1/toggle"),
        (Method::GET, "/api/enrollments/1/certificate"),
        (Method::POST, "/api/enrollments/1/certificate"),
        (Method::GET, "/api/leads"),
        (Method::GET, "/api/audit"),
    ];

    for (method, uri) in endpoints {
        let (status, body) = send(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn test_public_endpoints_open() {
    let state = create_test_state().await;
    let app = test_app(&state);

    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = send(&app, Method::GET, "/api/system/version", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());

    // Unknown code is a 404, not a 401
    let (status, _) = send(&app, Method::GET, "/api/certificates/verify/ABCDEF", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let state = create_test_state().await;
    let app = test_app(&state);

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_returns_working_token() {
    let state = create_test_state().await;
    let app = test_app(&state);
    let student = create_test_user_with_role(&state.db, "ada@example.com", UserRole::Student).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ADA@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["id"], student.id);
    assert!(body["user"].get("hashed_password").is_none());

    let token = body["access_token"].as_str().unwrap();
    let (status, me) = send(&app, Method::GET, "/api/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["role"], "student");
}

#[tokio::test]
async fn test_login_failures() {
    let state = create_test_state().await;
    let app = test_app(&state);
    create_test_user_with_role(&state.db, "ada@example.com", UserRole::Student).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "not-an-email", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let state = create_test_state().await;
    let app = test_app(&state);
    let student = create_test_user_with_role(&state.db, "ada@example.com", UserRole::Student).await;
    let token = token_for(&student);

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut active = student.into_active_model();
    active.is_active = Set(false);
    active.update(&state.db).await.unwrap();

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let state = create_test_state().await;
    let app = test_app(&state);
    let user = create_test_user_with_role(&state.db, "ops@example.com", UserRole::Admin).await;
    let token = token_for(&user);

    let (status, _) = send(&app, Method::GET, "/api/audit", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut active = user.into_active_model();
    active.role = Set(UserRole::Mentor);
    active.update(&state.db).await.unwrap();

    let (status, _) = send(&app, Method::GET, "/api/audit", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
