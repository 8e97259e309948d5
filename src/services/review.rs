//! Performance reviews written by staff for an enrollment.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::performance_review;
use crate::models::prelude::*;
use crate::schemas::CreateReview;

pub async fn create(
    db: &DbConn,
    enrollment_id: i64,
    reviewer_id: i64,
    request: CreateReview,
) -> Result<performance_review::Model> {
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    let now = Utc::now();
    let review_date = request.review_date.unwrap_or_else(|| now.date_naive());
    if request.next_review_date.is_some_and(|next| next < review_date) {
        return Err(AppError::BadRequest(
            "next_review_date must not precede review_date".to_string(),
        ));
    }

    let created = performance_review::ActiveModel {
        enrollment_id: Set(enrollment_id),
        reviewer_id: Set(Some(reviewer_id)),
        technical_skills: Set(request.technical_skills),
        soft_skills: Set(request.soft_skills),
        attendance: Set(request.attendance),
        participation: Set(request.participation),
        strengths: Set(request.strengths),
        areas_for_improvement: Set(request.areas_for_improvement),
        action_plan: Set(request.action_plan),
        review_date: Set(review_date),
        next_review_date: Set(request.next_review_date),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        review_id = created.id,
        enrollment_id,
        reviewer_id,
        "Performance review recorded"
    );

    Ok(created)
}

/// Reviews of an enrollment, most recent first
pub async fn list_for_enrollment(
    db: &DbConn,
    enrollment_id: i64,
) -> Result<Vec<performance_review::Model>> {
    Ok(PerformanceReview::find()
        .filter(performance_review::Column::EnrollmentId.eq(enrollment_id))
        .order_by_desc(performance_review::Column::ReviewDate)
        .order_by_desc(performance_review::Column::Id)
        .all(db)
        .await?)
}
