use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::endpoints::extractors::ValidatedJson;
use crate::error::Result;
use crate::middleware::permissions::{
    AssignmentManage, AssignmentView, Authorized, Scope, SubmissionCreate, SubmissionGrade,
    SubmissionView,
};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::{assignment, submission};
use crate::schemas::{
    AssignmentQuery, CreateAssignment, CreateSubmission, GradeSubmission, SubmissionResponse,
    UpdateAssignment,
};
use crate::services::{assignment as coursework, staff};
use crate::state::AppState;

/// Create assignment routes
pub fn assignments_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route(
            "/{assignment_id}",
            get(get_assignment)
                .patch(update_assignment)
                .delete(delete_assignment),
        )
        .route(
            "/{assignment_id}/submissions",
            get(list_submissions).post(submit),
        )
        .with_state(state)
}

/// Create submission routes
pub fn submissions_routes(state: AppState) -> Router {
    Router::new()
        .route("/{submission_id}", get(get_submission))
        .route("/{submission_id}/grade", post(grade_submission))
        .with_state(state)
}

async fn list_assignments(
    State(state): State<AppState>,
    _auth: Authorized<AssignmentView>,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<assignment::Model>>> {
    Ok(Json(coursework::list(&state.db, &query).await?))
}

async fn get_assignment(
    State(state): State<AppState>,
    _auth: Authorized<AssignmentView>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<assignment::Model>> {
    Ok(Json(coursework::get(&state.db, assignment_id).await?))
}

/// Instructors may only publish assignments for bootcamps they staff
async fn create_assignment(
    State(state): State<AppState>,
    auth: Authorized<AssignmentManage>,
    ValidatedJson(request): ValidatedJson<CreateAssignment>,
) -> Result<(StatusCode, Json<assignment::Model>)> {
    auth.ensure_bootcamp_access(&state.db, request.bootcamp_id)
        .await?;

    let created = coursework::create(&state.db, request, auth.user_id()).await?;

    state
        .audit
        .record(
            AuditAction::AssignmentCreated,
            ResourceType::Assignment,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "bootcamp_id": created.bootcamp_id })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_assignment(
    State(state): State<AppState>,
    auth: Authorized<AssignmentManage>,
    Path(assignment_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateAssignment>,
) -> Result<Json<assignment::Model>> {
    let current = coursework::get(&state.db, assignment_id).await?;
    auth.ensure_bootcamp_access(&state.db, current.bootcamp_id)
        .await?;

    let updated = coursework::update(&state.db, assignment_id, request).await?;

    state
        .audit
        .record(
            AuditAction::AssignmentUpdated,
            ResourceType::Assignment,
            assignment_id,
            Some(auth.user()),
            None,
        )
        .await;

    Ok(Json(updated))
}

async fn delete_assignment(
    State(state): State<AppState>,
    auth: Authorized<AssignmentManage>,
    Path(assignment_id): Path<i64>,
) -> Result<StatusCode> {
    let current = coursework::get(&state.db, assignment_id).await?;
    auth.ensure_bootcamp_access(&state.db, current.bootcamp_id)
        .await?;

    coursework::delete(&state.db, assignment_id).await?;

    state
        .audit
        .record(
            AuditAction::AssignmentDeleted,
            ResourceType::Assignment,
            assignment_id,
            Some(auth.user()),
            None,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Students hand in their own work
async fn submit(
    State(state): State<AppState>,
    auth: Authorized<SubmissionCreate>,
    Path(assignment_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateSubmission>,
) -> Result<(StatusCode, Json<submission::Model>)> {
    let created = coursework::submit(&state.db, assignment_id, auth.user_id(), request).await?;

    state
        .audit
        .record(
            AuditAction::SubmissionCreated,
            ResourceType::Submission,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({
                "assignment_id": assignment_id,
                "status": created.status,
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Submissions visible to the caller: all for admins, the caller's own for
/// students, those of students in the caller's batches for staff
async fn list_submissions(
    State(state): State<AppState>,
    auth: Authorized<SubmissionView>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<Vec<SubmissionResponse>>> {
    let assignment = coursework::get(&state.db, assignment_id).await?;

    let students = match auth.scope() {
        Scope::All => None,
        Scope::Own(own_id) => Some(vec![own_id]),
        Scope::Staff(staff_id) => {
            Some(staff::students_covered(&state.db, staff_id, assignment.bootcamp_id).await?)
        }
    };

    Ok(Json(
        coursework::list_submissions(&state.db, assignment_id, students.as_deref()).await?,
    ))
}

async fn get_submission(
    State(state): State<AppState>,
    auth: Authorized<SubmissionView>,
    Path(submission_id): Path<i64>,
) -> Result<Json<SubmissionResponse>> {
    let submission = coursework::get_submission(&state.db, submission_id).await?;
    let assignment = coursework::get(&state.db, submission.assignment_id).await?;
    auth.ensure_student_access(&state.db, submission.student_id, assignment.bootcamp_id)
        .await?;

    Ok(Json(coursework::with_grade(&state.db, submission).await?))
}

/// Grade a submission; regrading replaces the earlier grade
async fn grade_submission(
    State(state): State<AppState>,
    auth: Authorized<SubmissionGrade>,
    Path(submission_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<GradeSubmission>,
) -> Result<Json<SubmissionResponse>> {
    let submission = coursework::get_submission(&state.db, submission_id).await?;
    let assignment = coursework::get(&state.db, submission.assignment_id).await?;
    auth.ensure_student_access(&state.db, submission.student_id, assignment.bootcamp_id)
        .await?;

    let graded = coursework::grade(&state.db, submission_id, request, auth.user_id()).await?;

    state
        .audit
        .record(
            AuditAction::SubmissionGraded,
            ResourceType::Submission,
            submission_id,
            Some(auth.user()),
            Some(serde_json::json!({
                "score": graded.grade.as_ref().map(|g| g.score),
            })),
        )
        .await;

    Ok(Json(graded))
}
