//! Milestone tracking and progress calculation.
//!
//! `Enrollment.progress_percentage` is a write-through cache: every
//! recalculation derives it from the enrollment's `student_milestones` rows
//! and overwrites the stored value when it drifted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::enrollment::{self, EnrollmentStatus};
use crate::models::{milestone, student_milestone};

/// Completion state of one milestone for one enrollment
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneProgress {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub percentage_weight: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub enrollment_id: i64,
    pub bootcamp_id: i64,
    pub progress_percentage: i32,
    pub completed_milestones: usize,
    pub total_milestones: usize,
    pub milestones: Vec<MilestoneProgress>,
}

/// Result of a completion toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub progress: i32,
}

/// `floor(100 * completed / total)`, or 0 for a bootcamp without milestones
pub fn compute_percentage(total: usize, completed: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    (completed * 100 / total) as i32
}

/// Resolve the bootcamp an enrollment belongs to (through its batch)
pub async fn bootcamp_id_for<C: ConnectionTrait>(
    conn: &C,
    enrollment: &enrollment::Model,
) -> Result<i64> {
    Batch::find_by_id(enrollment.batch_id)
        .one(conn)
        .await?
        .map(|b| b.bootcamp_id)
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))
}

/// Recompute progress from milestone state and persist it if it changed
pub async fn recalculate<C: ConnectionTrait>(
    conn: &C,
    enrollment: &enrollment::Model,
) -> Result<ProgressReport> {
    let bootcamp_id = bootcamp_id_for(conn, enrollment).await?;

    let milestones = Milestone::find()
        .filter(milestone::Column::BootcampId.eq(bootcamp_id))
        .order_by_asc(milestone::Column::Order)
        .all(conn)
        .await?;

    let records: HashMap<i64, student_milestone::Model> = StudentMilestone::find()
        .filter(student_milestone::Column::EnrollmentId.eq(enrollment.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| (r.milestone_id, r))
        .collect();

    let milestones: Vec<MilestoneProgress> = milestones
        .into_iter()
        .map(|m| {
            let record = records.get(&m.id);
            MilestoneProgress {
                id: m.id,
                title: m.title,
                description: m.description,
                order: m.order,
                percentage_weight: m.percentage_weight,
                completed: record.map(|r| r.completed).unwrap_or(false),
                completed_at: record.and_then(|r| r.completed_at),
            }
        })
        .collect();

    let completed = milestones.iter().filter(|m| m.completed).count();
    let percentage = compute_percentage(milestones.len(), completed);

    if enrollment.progress_percentage != percentage {
        tracing::debug!(
            enrollment_id = enrollment.id,
            from = enrollment.progress_percentage,
            to = percentage,
            "Updating cached progress"
        );
        let mut active = enrollment.clone().into_active_model();
        active.progress_percentage = Set(percentage);
        active.updated_at = Set(Utc::now());
        active.update(conn).await?;
    }

    Ok(ProgressReport {
        enrollment_id: enrollment.id,
        bootcamp_id,
        progress_percentage: percentage,
        completed_milestones: completed,
        total_milestones: milestones.len(),
        milestones,
    })
}

/// Recalculate progress for an enrollment in its own transaction
pub async fn refresh(db: &DbConn, enrollment_id: i64) -> Result<ProgressReport> {
    let txn = db.begin().await?;

    let enrollment = Enrollment::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    let report = recalculate(&txn, &enrollment).await?;
    txn.commit().await?;

    Ok(report)
}

/// Flip one milestone's completion for an enrollment and recompute progress.
///
/// Only active enrollments can be toggled. The milestone row and the
/// enrollment's cached percentage are written in the same transaction.
pub async fn toggle_completion(
    db: &DbConn,
    enrollment_id: i64,
    milestone_id: i64,
) -> Result<ToggleOutcome> {
    let txn = db.begin().await?;

    let enrollment = Enrollment::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    if enrollment.status != EnrollmentStatus::Active {
        return Err(AppError::PreconditionFailed(format!(
            "Milestones can only be toggled on active enrollments, this one is {}",
            enrollment.status
        )));
    }

    let bootcamp_id = bootcamp_id_for(&txn, &enrollment).await?;

    Milestone::find_by_id(milestone_id)
        .one(&txn)
        .await?
        .filter(|m| m.bootcamp_id == bootcamp_id)
        .ok_or_else(|| AppError::NotFound("Milestone not found for this enrollment".to_string()))?;

    let existing = StudentMilestone::find()
        .filter(student_milestone::Column::EnrollmentId.eq(enrollment_id))
        .filter(student_milestone::Column::MilestoneId.eq(milestone_id))
        .one(&txn)
        .await?;

    let now = Utc::now();
    let completed = match existing {
        None => {
            student_milestone::ActiveModel {
                enrollment_id: Set(enrollment_id),
                milestone_id: Set(milestone_id),
                completed: Set(true),
                completed_at: Set(Some(now)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            true
        }
        Some(record) => {
            let completed = !record.completed;
            let mut active = record.into_active_model();
            active.completed = Set(completed);
            active.completed_at = Set(completed.then_some(now));
            active.update(&txn).await?;
            completed
        }
    };

    let report = recalculate(&txn, &enrollment).await?;
    txn.commit().await?;

    tracing::info!(
        enrollment_id,
        milestone_id,
        completed,
        progress = report.progress_percentage,
        "Milestone toggled"
    );

    Ok(ToggleOutcome {
        completed,
        progress: report.progress_percentage,
    })
}
