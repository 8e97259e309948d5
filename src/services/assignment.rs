//! Coursework: assignments per bootcamp, one submission per student and
//! assignment, and grading.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::enrollment::EnrollmentStatus;
use crate::models::prelude::*;
use crate::models::submission::SubmissionStatus;
use crate::models::{assignment, batch, enrollment, grade, submission};
use crate::schemas::{
    AssignmentQuery, CreateAssignment, CreateSubmission, GradeSubmission, SubmissionResponse,
    UpdateAssignment,
};

pub async fn create(
    db: &DbConn,
    request: CreateAssignment,
    created_by: i64,
) -> Result<assignment::Model> {
    Bootcamp::find_by_id(request.bootcamp_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bootcamp not found".to_string()))?;

    let now = Utc::now();
    let created = assignment::ActiveModel {
        bootcamp_id: Set(request.bootcamp_id),
        created_by_id: Set(Some(created_by)),
        title: Set(request.title),
        description: Set(request.description),
        due_date: Set(request.due_date),
        max_score: Set(request.max_score),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        assignment_id = created.id,
        bootcamp_id = created.bootcamp_id,
        "Assignment created"
    );

    Ok(created)
}

pub async fn get(db: &DbConn, assignment_id: i64) -> Result<assignment::Model> {
    Assignment::find_by_id(assignment_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))
}

/// List assignments, oldest first
pub async fn list(db: &DbConn, query: &AssignmentQuery) -> Result<Vec<assignment::Model>> {
    let mut select = Assignment::find();
    if let Some(bootcamp_id) = query.bootcamp_id {
        select = select.filter(assignment::Column::BootcampId.eq(bootcamp_id));
    }

    Ok(select
        .order_by_asc(assignment::Column::Id)
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(100).min(500))
        .all(db)
        .await?)
}

pub async fn update(
    db: &DbConn,
    assignment_id: i64,
    request: UpdateAssignment,
) -> Result<assignment::Model> {
    let current = get(db, assignment_id).await?;

    let mut active = current.into_active_model();
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(Some(due_date));
    }
    if let Some(max_score) = request.max_score {
        active.max_score = Set(max_score);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Delete an assignment with its submissions and grades
pub async fn delete(db: &DbConn, assignment_id: i64) -> Result<()> {
    let result = Assignment::delete_by_id(assignment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }
    tracing::info!(assignment_id, "Assignment deleted");
    Ok(())
}

/// Hand in work for an assignment.
///
/// The student needs an active enrollment in a batch of the assignment's
/// bootcamp. A second submission for the same assignment is a conflict.
/// Work handed in after the due date is marked late.
pub async fn submit(
    db: &DbConn,
    assignment_id: i64,
    student_id: i64,
    request: CreateSubmission,
) -> Result<submission::Model> {
    let assignment = get(db, assignment_id).await?;

    let enrolled = Enrollment::find()
        .inner_join(Batch)
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active))
        .filter(batch::Column::BootcampId.eq(assignment.bootcamp_id))
        .count(db)
        .await?;
    if enrolled == 0 {
        return Err(AppError::PreconditionFailed(
            "An active enrollment in this bootcamp is required to submit".to_string(),
        ));
    }

    let now = Utc::now();
    let status = match assignment.due_date {
        Some(due) if now > due => SubmissionStatus::Late,
        _ => SubmissionStatus::Submitted,
    };

    let created = submission::ActiveModel {
        assignment_id: Set(assignment_id),
        student_id: Set(student_id),
        submission_url: Set(request.submission_url),
        content: Set(request.content),
        status: Set(status),
        submitted_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Assignment already submitted"))?;

    tracing::info!(
        submission_id = created.id,
        assignment_id,
        student_id,
        late = status == SubmissionStatus::Late,
        "Submission received"
    );

    Ok(created)
}

pub async fn get_submission(db: &DbConn, submission_id: i64) -> Result<submission::Model> {
    Submission::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
}

pub async fn with_grade(
    db: &DbConn,
    submission: submission::Model,
) -> Result<SubmissionResponse> {
    let grade = Grade::find()
        .filter(grade::Column::SubmissionId.eq(submission.id))
        .one(db)
        .await?;
    Ok(SubmissionResponse { submission, grade })
}

/// Submissions for an assignment with their grades, optionally limited to
/// the given students
pub async fn list_submissions(
    db: &DbConn,
    assignment_id: i64,
    students: Option<&[i64]>,
) -> Result<Vec<SubmissionResponse>> {
    let mut select =
        Submission::find().filter(submission::Column::AssignmentId.eq(assignment_id));
    if let Some(students) = students {
        select = select.filter(submission::Column::StudentId.is_in(students.iter().copied()));
    }
    let submissions = select
        .order_by_asc(submission::Column::SubmittedAt)
        .order_by_asc(submission::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i64> = submissions.iter().map(|s| s.id).collect();
    let mut grades: HashMap<i64, grade::Model> = if ids.is_empty() {
        HashMap::new()
    } else {
        Grade::find()
            .filter(grade::Column::SubmissionId.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.submission_id, g))
            .collect()
    };

    Ok(submissions
        .into_iter()
        .map(|submission| SubmissionResponse {
            grade: grades.remove(&submission.id),
            submission,
        })
        .collect())
}

/// Grade a submission, replacing any earlier grade.
///
/// The score may not exceed the assignment's `max_score`.
pub async fn grade(
    db: &DbConn,
    submission_id: i64,
    request: GradeSubmission,
    graded_by: i64,
) -> Result<SubmissionResponse> {
    let txn = db.begin().await?;

    let current = Submission::find_by_id(submission_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
    let assignment = Assignment::find_by_id(current.assignment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    if request.score > assignment.max_score {
        return Err(AppError::BadRequest(format!(
            "Score {} exceeds the maximum of {}",
            request.score, assignment.max_score
        )));
    }

    let now = Utc::now();
    let existing = Grade::find()
        .filter(grade::Column::SubmissionId.eq(submission_id))
        .one(&txn)
        .await?;
    let graded = match existing {
        Some(previous) => {
            let mut active = previous.into_active_model();
            active.score = Set(request.score);
            active.feedback = Set(request.feedback);
            active.graded_by_id = Set(Some(graded_by));
            active.graded_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            grade::ActiveModel {
                submission_id: Set(submission_id),
                score: Set(request.score),
                feedback: Set(request.feedback),
                graded_by_id: Set(Some(graded_by)),
                graded_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let mut active = current.into_active_model();
    active.status = Set(SubmissionStatus::Graded);
    let submission = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(submission_id, score = graded.score, graded_by, "Submission graded");

    Ok(SubmissionResponse {
        submission,
        grade: Some(graded),
    })
}
