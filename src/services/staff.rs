//! Batch staffing: which instructors and mentors work with which batches.
//!
//! Staff reach in the authorization guard is derived from these rows.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::user::UserRole;
use crate::models::{batch, batch_staff, enrollment};

/// Attach an instructor or mentor to a batch
pub async fn assign(db: &DbConn, batch_id: i64, user_id: i64) -> Result<batch_staff::Model> {
    Batch::find_by_id(batch_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))?;

    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if !matches!(user.role, UserRole::Instructor | UserRole::Mentor) {
        return Err(AppError::BadRequest(
            "Only instructors and mentors can be assigned to a batch".to_string(),
        ));
    }

    let assigned = batch_staff::ActiveModel {
        batch_id: Set(batch_id),
        user_id: Set(user_id),
        role: Set(user.role),
        assigned_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "User is already assigned to this batch"))?;

    tracing::info!(batch_id, user_id, role = %user.role, "Staff assigned to batch");

    Ok(assigned)
}

pub async fn unassign(db: &DbConn, batch_id: i64, user_id: i64) -> Result<()> {
    let result = BatchStaff::delete_many()
        .filter(batch_staff::Column::BatchId.eq(batch_id))
        .filter(batch_staff::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Staff assignment not found".to_string()));
    }
    tracing::info!(batch_id, user_id, "Staff removed from batch");
    Ok(())
}

pub async fn list_for_batch(db: &DbConn, batch_id: i64) -> Result<Vec<batch_staff::Model>> {
    Ok(BatchStaff::find()
        .filter(batch_staff::Column::BatchId.eq(batch_id))
        .order_by_asc(batch_staff::Column::AssignedAt)
        .order_by_asc(batch_staff::Column::Id)
        .all(db)
        .await?)
}

pub async fn is_assigned<C: ConnectionTrait>(
    conn: &C,
    batch_id: i64,
    user_id: i64,
) -> Result<bool> {
    let count = BatchStaff::find()
        .filter(batch_staff::Column::BatchId.eq(batch_id))
        .filter(batch_staff::Column::UserId.eq(user_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Batches a staff member is attached to
pub async fn batch_ids_for<C: ConnectionTrait>(conn: &C, user_id: i64) -> Result<Vec<i64>> {
    Ok(BatchStaff::find()
        .select_only()
        .column(batch_staff::Column::BatchId)
        .filter(batch_staff::Column::UserId.eq(user_id))
        .into_tuple::<i64>()
        .all(conn)
        .await?)
}

/// Whether the user staffs any batch of the bootcamp
pub async fn teaches_bootcamp<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    bootcamp_id: i64,
) -> Result<bool> {
    let count = BatchStaff::find()
        .join(JoinType::InnerJoin, batch_staff::Relation::Batch.def())
        .filter(batch_staff::Column::UserId.eq(user_id))
        .filter(batch::Column::BootcampId.eq(bootcamp_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Whether the user staffs a batch of the bootcamp the student is enrolled in
pub async fn covers_student<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    student_id: i64,
    bootcamp_id: i64,
) -> Result<bool> {
    let batch_ids = batch_ids_for(conn, user_id).await?;
    if batch_ids.is_empty() {
        return Ok(false);
    }

    let count = Enrollment::find()
        .join(JoinType::InnerJoin, enrollment::Relation::Batch.def())
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::BatchId.is_in(batch_ids))
        .filter(batch::Column::BootcampId.eq(bootcamp_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Students enrolled in the user's batches of the bootcamp
pub async fn students_covered<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    bootcamp_id: i64,
) -> Result<Vec<i64>> {
    let batch_ids = batch_ids_for(conn, user_id).await?;
    if batch_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Enrollment::find()
        .select_only()
        .column(enrollment::Column::StudentId)
        .distinct()
        .join(JoinType::InnerJoin, enrollment::Relation::Batch.def())
        .filter(enrollment::Column::BatchId.is_in(batch_ids))
        .filter(batch::Column::BootcampId.eq(bootcamp_id))
        .into_tuple::<i64>()
        .all(conn)
        .await?)
}
