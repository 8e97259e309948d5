//! Certificate issuance and public verification.
//!
//! At most one certificate exists per enrollment. Both guarantees
//! (one per enrollment, globally unique code) are enforced by unique
//! indexes, so concurrent issuers converge on the row that won the insert.
//! Only active or completed enrollments are eligible.

use std::future::Future;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;

use crate::db::DbConn;
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::certificate;
use crate::models::enrollment::{self, EnrollmentStatus};
use crate::models::prelude::*;
use crate::services::progress;
use crate::services::security::generate_verification_code;

/// Attempts before giving up on finding an unused verification code
const MAX_ISSUE_ATTEMPTS: usize = 5;

const NOT_ELIGIBLE: &str = "Course not completed yet";

fn ineligible_status(status: EnrollmentStatus) -> AppError {
    AppError::PreconditionFailed(format!(
        "Certificates are not issued for {} enrollments",
        status
    ))
}

/// Public view of a certificate, returned by the verification endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CertificateVerification {
    pub student: String,
    pub bootcamp: String,
    pub batch: String,
    pub issued_at: DateTime<Utc>,
    pub verification_code: String,
}

/// Return the enrollment's certificate, issuing one if it is eligible and
/// none exists yet. The boolean is `true` when this call created it.
pub async fn get_or_issue(db: &DbConn, enrollment_id: i64) -> Result<(certificate::Model, bool)> {
    get_or_issue_with(db, enrollment_id, || async { generate_verification_code() }).await
}

/// [`get_or_issue`] with a caller-supplied verification code source.
///
/// `next_code` is awaited once per attempt, before the issuing transaction
/// opens. A unique violation on insert means either another issuer won the
/// enrollment or the code is taken: the first case returns the winner's
/// certificate, the second retries with a fresh code.
pub async fn get_or_issue_with<F, Fut>(
    db: &DbConn,
    enrollment_id: i64,
    mut next_code: F,
) -> Result<(certificate::Model, bool)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = String>,
{
    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        match try_issue(db, enrollment_id, &mut next_code).await {
            Ok(outcome) => return Ok(outcome),
            Err(AppError::Database(e)) if is_unique_violation(&e) => {
                if let Some(existing) = find_for_enrollment(db, enrollment_id).await? {
                    tracing::debug!(enrollment_id, "Certificate issued concurrently, reusing it");
                    return Ok((existing, false));
                }
                tracing::warn!(enrollment_id, attempt, "Verification code collision, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(AppError::Internal(format!(
        "Could not allocate a verification code for enrollment {} after {} attempts",
        enrollment_id, MAX_ISSUE_ATTEMPTS
    )))
}

async fn try_issue<F, Fut>(
    db: &DbConn,
    enrollment_id: i64,
    next_code: &mut F,
) -> Result<(certificate::Model, bool)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = String>,
{
    let enrollment = load_enrollment(db, enrollment_id).await?;

    if let Some(existing) = find_for_enrollment(db, enrollment_id).await? {
        return Ok((existing, false));
    }

    if !enrollment.status.is_certificate_eligible() {
        return Err(ineligible_status(enrollment.status));
    }

    let code = next_code().await;

    // The insert relies on the unique indexes rather than a re-read
    let txn = db.begin().await?;

    let enrollment = load_enrollment(&txn, enrollment_id).await?;
    if !enrollment.status.is_certificate_eligible() {
        return Err(ineligible_status(enrollment.status));
    }

    let report = progress::recalculate(&txn, &enrollment).await?;
    if report.progress_percentage < 100 {
        return Err(AppError::PreconditionFailed(NOT_ELIGIBLE.to_string()));
    }

    let now = Utc::now();
    let issued = certificate::ActiveModel {
        enrollment_id: Set(enrollment_id),
        verification_code: Set(code),
        issued_at: Set(now),
        certificate_url: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if enrollment.completed_at.is_none() {
        let mut active = enrollment.into_active_model();
        active.completed_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    tracing::info!(
        enrollment_id,
        certificate_id = issued.id,
        "Certificate issued"
    );

    Ok((issued, true))
}

async fn load_enrollment<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: i64,
) -> Result<enrollment::Model> {
    Enrollment::find_by_id(enrollment_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))
}

async fn find_for_enrollment(db: &DbConn, enrollment_id: i64) -> Result<Option<certificate::Model>> {
    Ok(Certificate::find()
        .filter(certificate::Column::EnrollmentId.eq(enrollment_id))
        .one(db)
        .await?)
}

/// Read an already issued certificate without issuing one
pub async fn find_issued(db: &DbConn, enrollment_id: i64) -> Result<certificate::Model> {
    let enrollment = load_enrollment(db, enrollment_id).await?;

    if let Some(existing) = find_for_enrollment(db, enrollment_id).await? {
        return Ok(existing);
    }

    if !enrollment.status.is_certificate_eligible() {
        return Err(ineligible_status(enrollment.status));
    }

    if enrollment.progress_percentage < 100 {
        return Err(AppError::PreconditionFailed(NOT_ELIGIBLE.to_string()));
    }

    Err(AppError::NotFound("Certificate not issued".to_string()))
}

/// Resolve a verification code to the public certificate details
pub async fn verify(db: &DbConn, code: &str) -> Result<CertificateVerification> {
    let code = code.trim().to_ascii_uppercase();
    let not_found = || AppError::NotFound("Certificate not found".to_string());

    let cert = Certificate::find()
        .filter(certificate::Column::VerificationCode.eq(code.as_str()))
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    let enrollment = Enrollment::find_by_id(cert.enrollment_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let student = User::find_by_id(enrollment.student_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let batch = Batch::find_by_id(enrollment.batch_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let bootcamp = Bootcamp::find_by_id(batch.bootcamp_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    Ok(CertificateVerification {
        student: student.full_name,
        bootcamp: bootcamp.title,
        batch: batch.name,
        issued_at: cert.issued_at,
        verification_code: cert.verification_code,
    })
}
