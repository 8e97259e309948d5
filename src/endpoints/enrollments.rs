use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::endpoints::extractors::ValidatedJson;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{
    authorize, Authorized, CertificateIssue, CertificateView, EnrollmentCreate, EnrollmentDelete,
    EnrollmentList, EnrollmentUpdateStatus, EnrollmentView, MilestoneToggle, Operation,
    ProgressView, ReviewCreate, ReviewView, Scope,
};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::enrollment::{self, EnrollmentStatus};
use crate::models::user::{self, UserRole};
use crate::models::{certificate, performance_review};
use crate::schemas::{CreateEnrollment, CreateReview, ProgressResponse, UpdateEnrollmentStatus};
use crate::services::certificate as certificates;
use crate::services::enrollment::{self as ledger, EnrollmentFilter};
use crate::services::progress::{self, ToggleOutcome};
use crate::services::{review, staff};
use crate::state::AppState;

/// Create enrollment routes
pub fn enrollments_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route(
            "/{enrollment_id}",
            get(get_enrollment).delete(delete_enrollment),
        )
        .route("/{enrollment_id}/status", patch(update_status))
        .route("/{enrollment_id}/progress", get(get_progress))
        .route(
            "/{enrollment_id}/milestones/{milestone_id}/toggle",
            post(toggle_milestone),
        )
        .route(
            "/{enrollment_id}/certificate",
            get(get_certificate).post(issue_certificate),
        )
        .route(
            "/{enrollment_id}/reviews",
            get(list_reviews).post(create_review),
        )
        .with_state(state)
}

/// List enrollments. Students only ever see their own, instructors and
/// mentors those of their batches.
async fn list_enrollments(
    State(state): State<AppState>,
    auth: Authorized<EnrollmentList>,
    Query(mut filter): Query<EnrollmentFilter>,
) -> Result<Json<Vec<enrollment::Model>>> {
    match auth.scope() {
        Scope::All => {}
        Scope::Own(own_id) => filter.student_id = Some(own_id),
        Scope::Staff(staff_id) => {
            filter.batch_ids = Some(staff::batch_ids_for(&state.db, staff_id).await?);
        }
    }
    Ok(Json(ledger::list(&state.db, &filter).await?))
}

async fn create_enrollment(
    State(state): State<AppState>,
    auth: Authorized<EnrollmentCreate>,
    ValidatedJson(request): ValidatedJson<CreateEnrollment>,
) -> Result<(StatusCode, Json<enrollment::Model>)> {
    let student_id = match (request.student_id, auth.user().role) {
        (Some(id), _) => id,
        (None, UserRole::Student) => auth.user_id(),
        (None, _) => {
            return Err(AppError::BadRequest("student_id is required".to_string()));
        }
    };
    auth.ensure_owner(student_id)?;

    if auth.scope().owner().is_some()
        && request
            .status
            .is_some_and(|s| s != EnrollmentStatus::Pending)
    {
        return Err(AppError::Forbidden(
            "Students can only request pending enrollments".to_string(),
        ));
    }

    let created = match ledger::enroll(&state.db, student_id, request.batch_id, request.status).await
    {
        Ok(created) => created,
        Err(e) => {
            state
                .audit
                .record_failure(
                    AuditAction::EnrollmentCreated,
                    ResourceType::Enrollment,
                    Some(auth.user()),
                    Some(serde_json::json!({
                        "student_id": student_id,
                        "batch_id": request.batch_id,
                    })),
                    &e.to_string(),
                )
                .await;
            return Err(e);
        }
    };

    state
        .audit
        .record(
            AuditAction::EnrollmentCreated,
            ResourceType::Enrollment,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({
                "student_id": created.student_id,
                "batch_id": created.batch_id,
                "status": created.status,
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_enrollment(
    State(state): State<AppState>,
    auth: Authorized<EnrollmentView>,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<enrollment::Model>> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;
    Ok(Json(enrollment))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    auth: Authorized<EnrollmentDelete>,
    Path(enrollment_id): Path<i64>,
) -> Result<StatusCode> {
    ledger::delete(&state.db, enrollment_id).await?;

    state
        .audit
        .record(
            AuditAction::EnrollmentDeleted,
            ResourceType::Enrollment,
            enrollment_id,
            Some(auth.user()),
            None,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Move an enrollment through its workflow. `force` is reserved for admins.
async fn update_status(
    State(state): State<AppState>,
    auth: Authorized<EnrollmentUpdateStatus>,
    Path(enrollment_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateEnrollmentStatus>,
) -> Result<Json<enrollment::Model>> {
    if request.force && auth.user().role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins can force completion".to_string(),
        ));
    }

    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    let (updated, previous) =
        ledger::update_status(&state.db, enrollment_id, request.status, request.force).await?;

    state
        .audit
        .record(
            AuditAction::EnrollmentStatusChanged,
            ResourceType::Enrollment,
            enrollment_id,
            Some(auth.user()),
            Some(serde_json::json!({
                "from": previous,
                "to": updated.status,
                "forced": request.force,
            })),
        )
        .await;

    Ok(Json(updated))
}

/// Current progress. For callers allowed to issue certificates, reaching
/// 100% on an active or completed enrollment issues it on the spot; other
/// callers never see a certificate here.
async fn get_progress(
    State(state): State<AppState>,
    auth: Authorized<ProgressView>,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<ProgressResponse>> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    let report = progress::refresh(&state.db, enrollment_id).await?;

    let may_issue = authorize(auth.user(), Operation::CertificateIssue).is_ok()
        && enrollment.status.is_certificate_eligible();

    let certificate = if may_issue && report.progress_percentage == 100 {
        let (certificate, created) = certificates::get_or_issue(&state.db, enrollment_id).await?;
        if created {
            record_issuance(&state, auth.user(), &certificate).await;
        }
        Some(certificate)
    } else {
        None
    };

    Ok(Json(ProgressResponse {
        report,
        certificate,
    }))
}

async fn toggle_milestone(
    State(state): State<AppState>,
    auth: Authorized<MilestoneToggle>,
    Path((enrollment_id, milestone_id)): Path<(i64, i64)>,
) -> Result<Json<ToggleOutcome>> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    let outcome = progress::toggle_completion(&state.db, enrollment_id, milestone_id).await?;

    state
        .audit
        .record(
            AuditAction::MilestoneToggled,
            ResourceType::Enrollment,
            enrollment_id,
            Some(auth.user()),
            Some(serde_json::json!({
                "milestone_id": milestone_id,
                "completed": outcome.completed,
                "progress": outcome.progress,
            })),
        )
        .await;

    Ok(Json(outcome))
}

/// Read the issued certificate; never issues one
async fn get_certificate(
    State(state): State<AppState>,
    auth: Authorized<CertificateView>,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<certificate::Model>> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    Ok(Json(
        certificates::find_issued(&state.db, enrollment_id).await?,
    ))
}

/// Issue the certificate if needed: 201 when created, 200 when it already existed
async fn issue_certificate(
    State(state): State<AppState>,
    auth: Authorized<CertificateIssue>,
    Path(enrollment_id): Path<i64>,
) -> Result<(StatusCode, Json<certificate::Model>)> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    let (certificate, created) = certificates::get_or_issue(&state.db, enrollment_id).await?;

    if created {
        record_issuance(&state, auth.user(), &certificate).await;
        Ok((StatusCode::CREATED, Json(certificate)))
    } else {
        Ok((StatusCode::OK, Json(certificate)))
    }
}

async fn record_issuance(
    state: &AppState,
    actor: &user::Model,
    certificate: &certificate::Model,
) {
    state
        .audit
        .record(
            AuditAction::CertificateIssued,
            ResourceType::Certificate,
            certificate.id,
            Some(actor),
            Some(serde_json::json!({ "enrollment_id": certificate.enrollment_id })),
        )
        .await;
}

async fn list_reviews(
    State(state): State<AppState>,
    auth: Authorized<ReviewView>,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<Vec<performance_review::Model>>> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    Ok(Json(review::list_for_enrollment(&state.db, enrollment_id).await?))
}

async fn create_review(
    State(state): State<AppState>,
    auth: Authorized<ReviewCreate>,
    Path(enrollment_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateReview>,
) -> Result<(StatusCode, Json<performance_review::Model>)> {
    let enrollment = ledger::get(&state.db, enrollment_id).await?;
    auth.ensure_enrollment_access(&state.db, &enrollment).await?;

    let created = review::create(&state.db, enrollment_id, auth.user_id(), request).await?;

    state
        .audit
        .record(
            AuditAction::ReviewCreated,
            ResourceType::PerformanceReview,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "enrollment_id": enrollment_id })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}
