//! Audit trail recording and access.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{
    create_batch_staff, create_test_state, create_test_user_with_role, seed_curriculum, send,
    test_app, token_for,
};

use cohortly::models::user::UserRole;
use cohortly::services::audit::AuditLogQuery;

#[tokio::test]
async fn test_lifecycle_actions_are_audited() {
    let state = create_test_state().await;
    let app = test_app(&state);
    let curriculum = seed_curriculum(&state.db, 1).await;
    let admin = create_test_user_with_role(&state.db, "admin@example.com", UserRole::Admin).await;
    let student = create_test_user_with_role(&state.db, "s@example.com", UserRole::Student).await;
    let instructor =
        create_batch_staff(&state.db, "i@example.com", UserRole::Instructor, curriculum.batch.id)
            .await;
    let admin_token = token_for(&admin);

    let (status, enrollment) = send(
        &app,
        Method::POST,
        "/api/enrollments",
        Some(&admin_token),
        Some(json!({ "student_id": student.id, "batch_id": curriculum.batch.id, "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let enrollment_id = enrollment["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!(
            "/api/enrollments/{}/milestones/{}/toggle",
            enrollment_id, curriculum.milestones[0].id
        ),
        Some(&token_for(&instructor)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let toggles = state
        .audit
        .list(&AuditLogQuery {
            action: Some("milestone_toggled".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(toggles.total, 1);
    assert_eq!(toggles.logs[0].user_id, Some(instructor.id));
    assert_eq!(toggles.logs[0].resource_type, "enrollment");
    assert_eq!(toggles.logs[0].resource_id, Some(enrollment_id.to_string()));

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/audit?action=enrollment_created",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["logs"][0]["user_email"], "admin@example.com");
    assert_eq!(page["logs"][0]["success"], true);
}

#[tokio::test]
async fn test_failed_enrollment_audited_as_failure() {
    let state = create_test_state().await;
    let app = test_app(&state);
    let curriculum = seed_curriculum(&state.db, 1).await;
    let admin = create_test_user_with_role(&state.db, "admin@example.com", UserRole::Admin).await;
    let student = create_test_user_with_role(&state.db, "s@example.com", UserRole::Student).await;
    let body = json!({ "student_id": student.id, "batch_id": curriculum.batch.id });

    let (status, _) = send(&app, Method::POST, "/api/enrollments", Some(&token_for(&admin)), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, "/api/enrollments", Some(&token_for(&admin)), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let page = state
        .audit
        .list(&AuditLogQuery {
            action: Some("enrollment_created".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    // newest first
    assert!(!page.logs[0].success);
    assert!(page.logs[0].error_message.is_some());
    assert!(page.logs[1].success);
}

#[tokio::test]
async fn test_login_attempts_audited() {
    let state = create_test_state().await;
    let app = test_app(&state);
    create_test_user_with_role(&state.db, "ada@example.com", UserRole::Student).await;

    send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "nope-nope" })),
    )
    .await;

    let failures = state
        .audit
        .list(&AuditLogQuery {
            action: Some("login_failed".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(failures.total, 1);
    assert!(!failures.logs[0].success);
}

#[tokio::test]
async fn test_audit_log_admin_only() {
    let state = create_test_state().await;
    let app = test_app(&state);

    for role in [UserRole::Instructor, UserRole::Mentor, UserRole::Sales, UserRole::Student] {
        let user =
            create_test_user_with_role(&state.db, &format!("{}@example.com", role), role).await;
        let (status, _) = send(&app, Method::GET, "/api/audit", Some(&token_for(&user)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", role);
    }
}
