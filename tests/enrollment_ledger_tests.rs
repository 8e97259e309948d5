//! Enrollment creation rules and the status workflow.

use sea_orm::{EntityTrait, PaginatorTrait};

mod common;
use common::{create_batch, create_test_db, create_test_user_with_role, enroll, seed_curriculum};

use cohortly::error::AppError;
use cohortly::models::enrollment::EnrollmentStatus;
use cohortly::models::prelude::*;
use cohortly::models::user::UserRole;
use cohortly::services::enrollment::{self as ledger, EnrollmentFilter};
use cohortly::services::{certificate, progress};

#[tokio::test]
async fn test_new_enrollment_defaults_to_pending_with_zero_progress() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;

    let created = ledger::enroll(&db, student.id, curriculum.batch.id, None)
        .await
        .unwrap();
    assert_eq!(created.status, EnrollmentStatus::Pending);
    assert_eq!(created.progress_percentage, 0);
    assert!(created.completed_at.is_none());
}

#[tokio::test]
async fn test_duplicate_enrollment_conflicts() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;

    ledger::enroll(&db, student.id, curriculum.batch.id, None)
        .await
        .unwrap();
    let err = ledger::enroll(&db, student.id, curriculum.batch.id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(Enrollment::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_only_students_can_be_enrolled() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let mentor = create_test_user_with_role(&db, "mentor@example.com", UserRole::Mentor).await;

    let err = ledger::enroll(&db, mentor.id, curriculum.batch.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_missing_student_or_batch_not_found() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;

    let err = ledger::enroll(&db, 4242, curriculum.batch.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ledger::enroll(&db, student.id, 4242, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cannot_start_in_terminal_state() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;

    for status in [EnrollmentStatus::Completed, EnrollmentStatus::Dropped] {
        let err = ledger::enroll(&db, student.id, curriculum.batch.id, Some(status))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{}", status);
    }
}

#[tokio::test]
async fn test_full_batch_rejects_enrollment() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let small = create_batch(&db, curriculum.bootcamp.id, "Pilot", 1).await;
    let first = create_test_user_with_role(&db, "one@example.com", UserRole::Student).await;
    let second = create_test_user_with_role(&db, "two@example.com", UserRole::Student).await;

    enroll(&db, first.id, small.id, EnrollmentStatus::Active).await;
    let err = ledger::enroll(&db, second.id, small.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_dropped_enrollment_frees_seat() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let small = create_batch(&db, curriculum.bootcamp.id, "Pilot", 1).await;
    let first = create_test_user_with_role(&db, "one@example.com", UserRole::Student).await;
    let second = create_test_user_with_role(&db, "two@example.com", UserRole::Student).await;

    let seat = enroll(&db, first.id, small.id, EnrollmentStatus::Active).await;
    ledger::update_status(&db, seat.id, EnrollmentStatus::Dropped, false)
        .await
        .unwrap();

    assert!(ledger::enroll(&db, second.id, small.id, None).await.is_ok());
}

#[tokio::test]
async fn test_forward_workflow() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Pending).await;

    let (active, previous) =
        ledger::update_status(&db, enrollment.id, EnrollmentStatus::Active, false)
            .await
            .unwrap();
    assert_eq!(previous, EnrollmentStatus::Pending);
    assert_eq!(active.status, EnrollmentStatus::Active);

    progress::toggle_completion(&db, enrollment.id, curriculum.milestones[0].id)
        .await
        .unwrap();

    let (completed, _) =
        ledger::update_status(&db, enrollment.id, EnrollmentStatus::Completed, false)
            .await
            .unwrap();
    assert_eq!(completed.status, EnrollmentStatus::Completed);
    assert!(completed.completed_at.is_some());
}

#[tokio::test]
async fn test_illegal_transitions_rejected() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Pending).await;

    // pending -> completed skips a step
    let err = ledger::update_status(&db, enrollment.id, EnrollmentStatus::Completed, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // same status
    let err = ledger::update_status(&db, enrollment.id, EnrollmentStatus::Pending, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    ledger::update_status(&db, enrollment.id, EnrollmentStatus::Active, false)
        .await
        .unwrap();
    ledger::update_status(&db, enrollment.id, EnrollmentStatus::Dropped, false)
        .await
        .unwrap();

    // dropped is terminal
    let err = ledger::update_status(&db, enrollment.id, EnrollmentStatus::Active, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_completion_requires_full_progress_without_override() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    progress::toggle_completion(&db, enrollment.id, curriculum.milestones[0].id)
        .await
        .unwrap();

    let err = ledger::update_status(&db, enrollment.id, EnrollmentStatus::Completed, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));

    let stored = ledger::get(&db, enrollment.id).await.unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Active);
}

#[tokio::test]
async fn test_admin_override_completes_early() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;

    let (completed, _) =
        ledger::update_status(&db, enrollment.id, EnrollmentStatus::Completed, true)
            .await
            .unwrap();
    assert_eq!(completed.status, EnrollmentStatus::Completed);
    assert_eq!(completed.progress_percentage, 0);

    // Forced completion does not make the enrollment certificate-eligible
    let err = certificate::get_or_issue(&db, enrollment.id).await.unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_list_filters_by_student() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let a = create_test_user_with_role(&db, "a@example.com", UserRole::Student).await;
    let b = create_test_user_with_role(&db, "b@example.com", UserRole::Student).await;
    enroll(&db, a.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    enroll(&db, b.id, curriculum.batch.id, EnrollmentStatus::Pending).await;

    let filter = EnrollmentFilter {
        student_id: Some(a.id),
        ..Default::default()
    };
    let listed = ledger::list(&db, &filter).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].student_id, a.id);

    let pending = EnrollmentFilter {
        status: Some(EnrollmentStatus::Pending),
        ..Default::default()
    };
    assert_eq!(ledger::list(&db, &pending).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_cascades_to_progress_and_certificate() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;
    let student = create_test_user_with_role(&db, "linus@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    progress::toggle_completion(&db, enrollment.id, curriculum.milestones[0].id)
        .await
        .unwrap();
    certificate::get_or_issue(&db, enrollment.id).await.unwrap();

    ledger::delete(&db, enrollment.id).await.unwrap();

    assert_eq!(StudentMilestone::find().count(&db).await.unwrap(), 0);
    assert_eq!(Certificate::find().count(&db).await.unwrap(), 0);

    let err = ledger::delete(&db, enrollment.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
