use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::DbConn;
use crate::endpoints::extractors::ValidatedJson;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{
    Authorized, BatchStaffManage, CurriculumManage, CurriculumView, MilestoneManage,
};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::batch::{self, BatchStatus};
use crate::models::prelude::*;
use crate::models::{batch_staff, bootcamp, milestone};
use crate::schemas::{AssignStaff, BootcampDetail, CreateBatch, CreateBootcamp, CreateMilestone};
use crate::services::staff;
use crate::state::AppState;

/// Create bootcamp routes
pub fn bootcamps_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_bootcamps).post(create_bootcamp))
        .route("/{bootcamp_id}", get(get_bootcamp))
        .route(
            "/{bootcamp_id}/batches",
            get(list_batches).post(create_batch),
        )
        .route(
            "/{bootcamp_id}/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route(
            "/{bootcamp_id}/batches/{batch_id}/staff",
            get(list_staff).post(assign_staff),
        )
        .route(
            "/{bootcamp_id}/batches/{batch_id}/staff/{user_id}",
            delete(unassign_staff),
        )
        .with_state(state)
}

async fn find_bootcamp(db: &DbConn, bootcamp_id: i64) -> Result<bootcamp::Model> {
    Bootcamp::find_by_id(bootcamp_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bootcamp not found".to_string()))
}

/// A batch, which must belong to the bootcamp
async fn find_batch(db: &DbConn, bootcamp_id: i64, batch_id: i64) -> Result<batch::Model> {
    Batch::find_by_id(batch_id)
        .one(db)
        .await?
        .filter(|b| b.bootcamp_id == bootcamp_id)
        .ok_or_else(|| AppError::NotFound("Batch not found".to_string()))
}

async fn load_batches(db: &DbConn, bootcamp_id: i64) -> Result<Vec<batch::Model>> {
    Ok(Batch::find()
        .filter(batch::Column::BootcampId.eq(bootcamp_id))
        .order_by_asc(batch::Column::StartDate)
        .order_by_asc(batch::Column::Id)
        .all(db)
        .await?)
}

async fn load_milestones(db: &DbConn, bootcamp_id: i64) -> Result<Vec<milestone::Model>> {
    Ok(Milestone::find()
        .filter(milestone::Column::BootcampId.eq(bootcamp_id))
        .order_by_asc(milestone::Column::Order)
        .all(db)
        .await?)
}

async fn list_bootcamps(
    State(state): State<AppState>,
    _auth: Authorized<CurriculumView>,
) -> Result<Json<Vec<bootcamp::Model>>> {
    let bootcamps = Bootcamp::find()
        .order_by_asc(bootcamp::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(bootcamps))
}

async fn create_bootcamp(
    State(state): State<AppState>,
    auth: Authorized<CurriculumManage>,
    ValidatedJson(request): ValidatedJson<CreateBootcamp>,
) -> Result<(StatusCode, Json<bootcamp::Model>)> {
    let now = Utc::now();
    let created = bootcamp::ActiveModel {
        title: Set(request.title),
        description: Set(request.description),
        mode: Set(request.mode),
        price_cents: Set(request.price_cents),
        duration_weeks: Set(request.duration_weeks),
        created_by_id: Set(Some(auth.user_id())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state
        .audit
        .record(
            AuditAction::BootcampCreated,
            ResourceType::Bootcamp,
            created.id,
            Some(auth.user()),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Bootcamp with its batches and ordered milestones
async fn get_bootcamp(
    State(state): State<AppState>,
    _auth: Authorized<CurriculumView>,
    Path(bootcamp_id): Path<i64>,
) -> Result<Json<BootcampDetail>> {
    let bootcamp = find_bootcamp(&state.db, bootcamp_id).await?;
    let batches = load_batches(&state.db, bootcamp_id).await?;
    let milestones = load_milestones(&state.db, bootcamp_id).await?;

    Ok(Json(BootcampDetail {
        bootcamp,
        batches,
        milestones,
    }))
}

async fn list_batches(
    State(state): State<AppState>,
    _auth: Authorized<CurriculumView>,
    Path(bootcamp_id): Path<i64>,
) -> Result<Json<Vec<batch::Model>>> {
    find_bootcamp(&state.db, bootcamp_id).await?;
    Ok(Json(load_batches(&state.db, bootcamp_id).await?))
}

async fn create_batch(
    State(state): State<AppState>,
    auth: Authorized<CurriculumManage>,
    Path(bootcamp_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateBatch>,
) -> Result<(StatusCode, Json<batch::Model>)> {
    find_bootcamp(&state.db, bootcamp_id).await?;

    let now = Utc::now();
    let created = batch::ActiveModel {
        bootcamp_id: Set(bootcamp_id),
        name: Set(request.name),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        capacity: Set(request.capacity),
        status: Set(request.status.unwrap_or(BatchStatus::Upcoming)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state
        .audit
        .record(
            AuditAction::BatchCreated,
            ResourceType::Batch,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "bootcamp_id": bootcamp_id })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_milestones(
    State(state): State<AppState>,
    _auth: Authorized<CurriculumView>,
    Path(bootcamp_id): Path<i64>,
) -> Result<Json<Vec<milestone::Model>>> {
    find_bootcamp(&state.db, bootcamp_id).await?;
    Ok(Json(load_milestones(&state.db, bootcamp_id).await?))
}

/// Add a milestone; `order` must be unique within the bootcamp
async fn create_milestone(
    State(state): State<AppState>,
    auth: Authorized<MilestoneManage>,
    Path(bootcamp_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateMilestone>,
) -> Result<(StatusCode, Json<milestone::Model>)> {
    find_bootcamp(&state.db, bootcamp_id).await?;

    let created = milestone::ActiveModel {
        bootcamp_id: Set(bootcamp_id),
        title: Set(request.title),
        description: Set(request.description),
        order: Set(request.order),
        percentage_weight: Set(request.percentage_weight),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        AppError::conflict_on_unique(e, "A milestone with this order already exists")
    })?;

    state
        .audit
        .record(
            AuditAction::MilestoneCreated,
            ResourceType::Milestone,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "bootcamp_id": bootcamp_id, "order": created.order })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_staff(
    State(state): State<AppState>,
    _auth: Authorized<BatchStaffManage>,
    Path((bootcamp_id, batch_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<batch_staff::Model>>> {
    find_batch(&state.db, bootcamp_id, batch_id).await?;
    Ok(Json(staff::list_for_batch(&state.db, batch_id).await?))
}

/// Attach an instructor or mentor to a batch
async fn assign_staff(
    State(state): State<AppState>,
    auth: Authorized<BatchStaffManage>,
    Path((bootcamp_id, batch_id)): Path<(i64, i64)>,
    ValidatedJson(request): ValidatedJson<AssignStaff>,
) -> Result<(StatusCode, Json<batch_staff::Model>)> {
    find_batch(&state.db, bootcamp_id, batch_id).await?;

    let assigned = staff::assign(&state.db, batch_id, request.user_id).await?;

    state
        .audit
        .record(
            AuditAction::StaffAssigned,
            ResourceType::Batch,
            batch_id,
            Some(auth.user()),
            Some(serde_json::json!({ "user_id": assigned.user_id, "role": assigned.role })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(assigned)))
}

async fn unassign_staff(
    State(state): State<AppState>,
    auth: Authorized<BatchStaffManage>,
    Path((bootcamp_id, batch_id, user_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode> {
    find_batch(&state.db, bootcamp_id, batch_id).await?;

    staff::unassign(&state.db, batch_id, user_id).await?;

    state
        .audit
        .record(
            AuditAction::StaffUnassigned,
            ResourceType::Batch,
            batch_id,
            Some(auth.user()),
            Some(serde_json::json!({ "user_id": user_id })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
