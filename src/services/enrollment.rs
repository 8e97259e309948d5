//! Enrollment ledger: creation, status workflow and lookups.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::batch::{self, BatchStatus};
use crate::models::enrollment::{self, EnrollmentStatus};
use crate::models::prelude::*;
use crate::models::user::UserRole;
use crate::services::progress;

/// Query filters for listing enrollments
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EnrollmentFilter {
    pub student_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub status: Option<EnrollmentStatus>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Restrict to these batches (staff scope); never read from the query string
    #[serde(skip)]
    pub batch_ids: Option<Vec<i64>>,
}

/// Batch lookup for the seat count. Outside SQLite the row is locked until
/// the surrounding transaction ends, so concurrent enrollments into the same
/// batch count seats one after another. SQLite serializes writers on its own.
fn batch_for_seat_check(backend: DbBackend, batch_id: i64) -> Select<batch::Entity> {
    let query = Batch::find_by_id(batch_id);
    match backend {
        DbBackend::Sqlite => query,
        _ => query.lock_exclusive(),
    }
}

/// Create an enrollment on any connection (pool or open transaction).
///
/// Duplicate `(student, batch)` pairs are rejected by the unique index, not
/// by a prior lookup. The capacity check is only race-free when `conn` is a
/// transaction (see [`enroll`]).
pub async fn create<C: ConnectionTrait>(
    conn: &C,
    student_id: i64,
    batch_id: i64,
    initial_status: Option<EnrollmentStatus>,
) -> Result<enrollment::Model> {
    let status = initial_status.unwrap_or(EnrollmentStatus::Pending);
    if !matches!(status, EnrollmentStatus::Pending | EnrollmentStatus::Active) {
        return Err(AppError::BadRequest(format!(
            "Enrollments cannot start as {}",
            status
        )));
    }

    let student = User::find_by_id(student_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    if student.role != UserRole::Student {
        return Err(AppError::BadRequest(
            "Only students can be enrolled".to_string(),
        ));
    }

    let batch = batch_for_seat_check(conn.get_database_backend(), batch_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;
    if batch.status == BatchStatus::Cancelled {
        return Err(AppError::BadRequest("Batch is cancelled".to_string()));
    }

    let seats_taken = Enrollment::find()
        .filter(enrollment::Column::BatchId.eq(batch_id))
        .filter(enrollment::Column::Status.ne(EnrollmentStatus::Dropped))
        .count(conn)
        .await?;
    if seats_taken >= batch.capacity.max(0) as u64 {
        return Err(AppError::Conflict("Batch is full".to_string()));
    }

    let now = Utc::now();
    let created = enrollment::ActiveModel {
        student_id: Set(student_id),
        batch_id: Set(batch_id),
        status: Set(status),
        enrolled_at: Set(now),
        completed_at: Set(None),
        progress_percentage: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Student is already enrolled in this batch"))?;

    tracing::info!(
        enrollment_id = created.id,
        student_id,
        batch_id,
        status = %status,
        "Enrollment created"
    );

    Ok(created)
}

/// Create an enrollment in its own transaction
pub async fn enroll(
    db: &DbConn,
    student_id: i64,
    batch_id: i64,
    initial_status: Option<EnrollmentStatus>,
) -> Result<enrollment::Model> {
    let txn = db.begin().await?;
    let created = create(&txn, student_id, batch_id, initial_status).await?;
    txn.commit().await?;
    Ok(created)
}

/// Move an enrollment along the status workflow.
///
/// Completion requires 100% progress unless `admin_override` is set.
/// Returns the updated enrollment and the status it left.
pub async fn update_status(
    db: &DbConn,
    enrollment_id: i64,
    new_status: EnrollmentStatus,
    admin_override: bool,
) -> Result<(enrollment::Model, EnrollmentStatus)> {
    let txn = db.begin().await?;

    let current = Enrollment::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;
    let previous = current.status;

    if !previous.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition {
            from: previous.to_string(),
            to: new_status.to_string(),
        });
    }

    if new_status == EnrollmentStatus::Completed {
        let report = progress::recalculate(&txn, &current).await?;
        if report.progress_percentage < 100 {
            if !admin_override {
                return Err(AppError::PreconditionFailed(format!(
                    "Enrollment is {}% complete; completion requires 100%",
                    report.progress_percentage
                )));
            }
            tracing::warn!(
                enrollment_id,
                progress = report.progress_percentage,
                "Completion forced by admin override"
            );
        }
    }

    let now = Utc::now();
    let stamp_completion =
        new_status == EnrollmentStatus::Completed && current.completed_at.is_none();

    let mut active = current.into_active_model();
    active.status = Set(new_status);
    if stamp_completion {
        active.completed_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        enrollment_id,
        from = %previous,
        to = %new_status,
        "Enrollment status changed"
    );

    Ok((updated, previous))
}

pub async fn get(db: &DbConn, enrollment_id: i64) -> Result<enrollment::Model> {
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))
}

/// List enrollments, newest first
pub async fn list(db: &DbConn, filter: &EnrollmentFilter) -> Result<Vec<enrollment::Model>> {
    let mut query = Enrollment::find();

    if let Some(student_id) = filter.student_id {
        query = query.filter(enrollment::Column::StudentId.eq(student_id));
    }
    if let Some(batch_id) = filter.batch_id {
        query = query.filter(enrollment::Column::BatchId.eq(batch_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(enrollment::Column::Status.eq(status));
    }
    if let Some(batch_ids) = &filter.batch_ids {
        query = query.filter(enrollment::Column::BatchId.is_in(batch_ids.iter().copied()));
    }

    let enrollments = query
        .order_by_desc(enrollment::Column::EnrolledAt)
        .order_by_desc(enrollment::Column::Id)
        .offset(filter.skip.unwrap_or(0))
        .limit(filter.limit.unwrap_or(100).min(500))
        .all(db)
        .await?;

    Ok(enrollments)
}

/// Delete an enrollment together with its milestone rows and certificate
pub async fn delete(db: &DbConn, enrollment_id: i64) -> Result<()> {
    let result = Enrollment::delete_by_id(enrollment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Enrollment not found".to_string()));
    }
    tracing::info!(enrollment_id, "Enrollment deleted");
    Ok(())
}
