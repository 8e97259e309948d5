//! Milestone tracking and progress calculation against a real schema.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set};

mod common;
use common::{create_bootcamp, create_milestone, create_test_db, create_test_user_with_role, enroll, seed_curriculum};

use cohortly::error::AppError;
use cohortly::models::enrollment::EnrollmentStatus;
use cohortly::models::prelude::*;
use cohortly::models::student_milestone;
use cohortly::models::user::UserRole;
use cohortly::services::progress;

#[tokio::test]
async fn test_four_milestone_progression() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 4).await;
    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;

    let m = &curriculum.milestones;
    let first = progress::toggle_completion(&db, enrollment.id, m[0].id).await.unwrap();
    assert!(first.completed);
    assert_eq!(first.progress, 25);

    let second = progress::toggle_completion(&db, enrollment.id, m[1].id).await.unwrap();
    assert_eq!(second.progress, 50);

    let third = progress::toggle_completion(&db, enrollment.id, m[2].id).await.unwrap();
    assert_eq!(third.progress, 75);

    let fourth = progress::toggle_completion(&db, enrollment.id, m[3].id).await.unwrap();
    assert_eq!(fourth.progress, 100);

    let stored = Enrollment::find_by_id(enrollment.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.progress_percentage, 100);
}

#[tokio::test]
async fn test_double_toggle_restores_state() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 3).await;
    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    let milestone_id = curriculum.milestones[0].id;

    let on = progress::toggle_completion(&db, enrollment.id, milestone_id).await.unwrap();
    assert!(on.completed);
    assert_eq!(on.progress, 33);

    let off = progress::toggle_completion(&db, enrollment.id, milestone_id).await.unwrap();
    assert!(!off.completed);
    assert_eq!(off.progress, 0);

    // The row is kept, flipped back with its timestamp cleared
    let record = StudentMilestone::find()
        .filter(student_milestone::Column::EnrollmentId.eq(enrollment.id))
        .filter(student_milestone::Column::MilestoneId.eq(milestone_id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.completed);
    assert!(record.completed_at.is_none());
}

#[tokio::test]
async fn test_toggle_rejects_milestone_of_other_bootcamp() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let other_bootcamp = create_bootcamp(&db, "Data Science").await;
    let foreign = create_milestone(&db, other_bootcamp.id, 1).await;

    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;

    let err = progress::toggle_completion(&db, enrollment.id, foreign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let rows = StudentMilestone::find().count(&db).await.unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_toggle_unknown_enrollment_not_found() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 1).await;

    let err = progress::toggle_completion(&db, 999, curriculum.milestones[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_toggle_requires_active_enrollment() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let milestone_id = curriculum.milestones[0].id;

    let pending_student = create_test_user_with_role(&db, "p@example.com", UserRole::Student).await;
    let pending = enroll(&db, pending_student.id, curriculum.batch.id, EnrollmentStatus::Pending).await;
    let err = progress::toggle_completion(&db, pending.id, milestone_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));

    let dropped_student = create_test_user_with_role(&db, "d@example.com", UserRole::Student).await;
    let dropped = enroll(&db, dropped_student.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    progress::toggle_completion(&db, dropped.id, milestone_id).await.unwrap();
    cohortly::services::enrollment::update_status(&db, dropped.id, EnrollmentStatus::Dropped, false)
        .await
        .unwrap();
    let err = progress::toggle_completion(&db, dropped.id, milestone_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));

    // The rejected toggle left the dropped enrollment's milestone untouched
    let record = StudentMilestone::find()
        .filter(student_milestone::Column::EnrollmentId.eq(dropped.id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(record.completed);
    assert_eq!(
        StudentMilestone::find()
            .filter(student_milestone::Column::EnrollmentId.eq(pending.id))
            .count(&db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_bootcamp_without_milestones_reports_zero() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 0).await;
    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;

    let report = progress::refresh(&db, enrollment.id).await.unwrap();
    assert_eq!(report.progress_percentage, 0);
    assert_eq!(report.total_milestones, 0);
    assert!(report.milestones.is_empty());
}

#[tokio::test]
async fn test_recalculation_overwrites_stale_cache_and_is_stable() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 4).await;
    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;
    progress::toggle_completion(&db, enrollment.id, curriculum.milestones[0].id)
        .await
        .unwrap();

    // Corrupt the cached value directly
    let stored = Enrollment::find_by_id(enrollment.id).one(&db).await.unwrap().unwrap();
    let mut active = stored.into_active_model();
    active.progress_percentage = Set(90);
    active.update(&db).await.unwrap();

    let first = progress::refresh(&db, enrollment.id).await.unwrap();
    let second = progress::refresh(&db, enrollment.id).await.unwrap();
    assert_eq!(first.progress_percentage, 25);
    assert_eq!(second.progress_percentage, 25);

    let stored = Enrollment::find_by_id(enrollment.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.progress_percentage, 25);
}

#[tokio::test]
async fn test_new_milestone_lowers_progress() {
    let db = create_test_db().await;
    let curriculum = seed_curriculum(&db, 2).await;
    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, curriculum.batch.id, EnrollmentStatus::Active).await;

    for m in &curriculum.milestones {
        progress::toggle_completion(&db, enrollment.id, m.id).await.unwrap();
    }
    assert_eq!(progress::refresh(&db, enrollment.id).await.unwrap().progress_percentage, 100);

    create_milestone(&db, curriculum.bootcamp.id, 3).await;
    let report = progress::refresh(&db, enrollment.id).await.unwrap();
    assert_eq!(report.progress_percentage, 66);
    assert_eq!(report.completed_milestones, 2);
    assert_eq!(report.total_milestones, 3);
}

#[tokio::test]
async fn test_report_lists_milestones_in_order() {
    let db = create_test_db().await;
    let bootcamp = create_bootcamp(&db, "Cloud").await;
    let batch = common::create_batch(&db, bootcamp.id, "Autumn", 10).await;
    // Inserted out of order on purpose
    create_milestone(&db, bootcamp.id, 3).await;
    create_milestone(&db, bootcamp.id, 1).await;
    create_milestone(&db, bootcamp.id, 2).await;

    let student = create_test_user_with_role(&db, "ada@example.com", UserRole::Student).await;
    let enrollment = enroll(&db, student.id, batch.id, EnrollmentStatus::Active).await;

    let report = progress::refresh(&db, enrollment.id).await.unwrap();
    let orders: Vec<i32> = report.milestones.iter().map(|m| m.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}
