//! Sales pipeline: leads, follow-up logs and conversion into students.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::db::DbConn;
use crate::error::{AppError, Result};
use crate::models::enrollment::{self, EnrollmentStatus};
use crate::models::lead::{self, LeadStatus};
use crate::models::prelude::*;
use crate::models::user::{self, UserRole};
use crate::models::lead_log;
use crate::services::enrollment as enrollment_service;
use crate::services::security::hash_password;

/// Fields accepted when creating a lead
#[derive(Debug, Clone)]
pub struct NewLead {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub assigned_to_id: Option<i64>,
}

/// Everything written by a successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub lead: lead::Model,
    pub student: user::Model,
    pub enrollment: Option<enrollment::Model>,
}

pub async fn create(db: &DbConn, input: NewLead) -> Result<lead::Model> {
    if let Some(assignee_id) = input.assigned_to_id {
        let assignee = User::find_by_id(assignee_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignee not found".to_string()))?;
        if !matches!(assignee.role, UserRole::Admin | UserRole::Sales) {
            return Err(AppError::BadRequest(
                "Leads can only be assigned to sales staff".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let created = lead::ActiveModel {
        full_name: Set(input.full_name),
        email: Set(input.email.trim().to_lowercase()),
        phone: Set(input.phone),
        source: Set(input.source),
        status: Set(LeadStatus::New),
        assigned_to_id: Set(input.assigned_to_id),
        converted_to_user_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(lead_id = created.id, "Lead created");
    Ok(created)
}

/// List leads, optionally restricted to one assignee
pub async fn list(
    db: &DbConn,
    assigned_to: Option<i64>,
    status: Option<LeadStatus>,
) -> Result<Vec<lead::Model>> {
    let mut query = Lead::find();
    if let Some(assignee_id) = assigned_to {
        query = query.filter(lead::Column::AssignedToId.eq(assignee_id));
    }
    if let Some(status) = status {
        query = query.filter(lead::Column::Status.eq(status));
    }

    Ok(query
        .order_by_desc(lead::Column::CreatedAt)
        .order_by_desc(lead::Column::Id)
        .all(db)
        .await?)
}

pub async fn get(db: &DbConn, lead_id: i64) -> Result<lead::Model> {
    Lead::find_by_id(lead_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))
}

/// Follow-up history of a lead, oldest first
pub async fn logs(db: &DbConn, lead_id: i64) -> Result<Vec<lead_log::Model>> {
    Ok(LeadLog::find()
        .filter(lead_log::Column::LeadId.eq(lead_id))
        .order_by_asc(lead_log::Column::CreatedAt)
        .order_by_asc(lead_log::Column::Id)
        .all(db)
        .await?)
}

pub async fn add_log(
    db: &DbConn,
    lead_id: i64,
    note: String,
    next_follow_up: Option<DateTime<Utc>>,
    author_id: i64,
) -> Result<lead_log::Model> {
    get(db, lead_id).await?;

    let entry = lead_log::ActiveModel {
        lead_id: Set(lead_id),
        note: Set(note),
        next_follow_up: Set(next_follow_up),
        created_by_id: Set(Some(author_id)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(entry)
}

/// Move a lead through the pipeline. `converted` is reserved for [`convert`].
pub async fn update_status(db: &DbConn, lead_id: i64, status: LeadStatus) -> Result<lead::Model> {
    if status == LeadStatus::Converted {
        return Err(AppError::BadRequest(
            "Use the convert operation to convert a lead".to_string(),
        ));
    }

    let current = get(db, lead_id).await?;
    if current.status == LeadStatus::Converted {
        return Err(AppError::Conflict(
            "Converted leads cannot change status".to_string(),
        ));
    }

    let mut active = current.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Turn a lead into a student account, optionally enrolling them.
///
/// The user, the lead update, the log entry and the enrollment are written
/// in one transaction; any failure leaves the lead unconverted.
pub async fn convert(
    db: &DbConn,
    lead_id: i64,
    actor: &user::Model,
    temporary_password: &str,
    batch_id: Option<i64>,
) -> Result<Conversion> {
    let hashed_password = hash_password(temporary_password)?;

    let txn = db.begin().await?;

    let current = Lead::find_by_id(lead_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;
    if current.status == LeadStatus::Converted {
        return Err(AppError::Conflict("Lead is already converted".to_string()));
    }

    let email_taken = User::find()
        .filter(user::Column::Email.eq(current.email.as_str()))
        .one(&txn)
        .await?
        .is_some();
    if email_taken {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let student = user::ActiveModel {
        email: Set(current.email.clone()),
        full_name: Set(current.full_name.clone()),
        phone: Set(current.phone.clone()),
        hashed_password: Set(hashed_password),
        role: Set(UserRole::Student),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "A user with this email already exists"))?;

    let mut active = current.into_active_model();
    active.status = Set(LeadStatus::Converted);
    active.converted_to_user_id = Set(Some(student.id));
    active.updated_at = Set(now);
    let converted = active.update(&txn).await?;

    lead_log::ActiveModel {
        lead_id: Set(lead_id),
        note: Set(format!("Converted to student account #{}", student.id)),
        next_follow_up: Set(None),
        created_by_id: Set(Some(actor.id)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let enrollment = match batch_id {
        Some(batch_id) => Some(
            enrollment_service::create(&txn, student.id, batch_id, Some(EnrollmentStatus::Active))
                .await?,
        ),
        None => None,
    };

    txn.commit().await?;

    tracing::info!(
        lead_id,
        student_id = student.id,
        enrolled = enrollment.is_some(),
        "Lead converted"
    );

    Ok(Conversion {
        lead: converted,
        student,
        enrollment,
    })
}
