use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::endpoints::extractors::ValidatedJson;
use crate::error::Result;
use crate::middleware::permissions::{Authorized, LeadConvert, LeadCreate, LeadUpdate, LeadView};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::user::UserRole;
use crate::models::{lead, lead_log};
use crate::schemas::{
    ConvertLead, CreateLead, CreateLeadLog, LeadDetail, LeadListParams, UpdateLeadStatus,
};
use crate::services::lead::{self as leads, Conversion, NewLead};
use crate::state::AppState;

/// Create lead routes
pub fn leads_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/{lead_id}", get(get_lead))
        .route("/{lead_id}/status", patch(update_lead_status))
        .route("/{lead_id}/logs", post(add_lead_log))
        .route("/{lead_id}/convert", post(convert_lead))
        .with_state(state)
}

/// Sales reps see the leads assigned to them; admins see all
async fn list_leads(
    State(state): State<AppState>,
    auth: Authorized<LeadView>,
    Query(params): Query<LeadListParams>,
) -> Result<Json<Vec<lead::Model>>> {
    let leads = leads::list(&state.db, auth.scope().owner(), params.status).await?;
    Ok(Json(leads))
}

async fn create_lead(
    State(state): State<AppState>,
    auth: Authorized<LeadCreate>,
    ValidatedJson(request): ValidatedJson<CreateLead>,
) -> Result<(StatusCode, Json<lead::Model>)> {
    let assigned_to_id = match auth.user().role {
        UserRole::Admin => request.assigned_to_id,
        _ => Some(auth.user_id()),
    };

    let created = leads::create(
        &state.db,
        NewLead {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            source: request.source,
            assigned_to_id,
        },
    )
    .await?;

    state
        .audit
        .record(
            AuditAction::LeadCreated,
            ResourceType::Lead,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "assigned_to_id": created.assigned_to_id })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_lead(
    State(state): State<AppState>,
    auth: Authorized<LeadView>,
    Path(lead_id): Path<i64>,
) -> Result<Json<LeadDetail>> {
    let lead = leads::get(&state.db, lead_id).await?;
    auth.ensure_owner(lead.assigned_to_id)?;

    let logs = leads::logs(&state.db, lead_id).await?;
    Ok(Json(LeadDetail { lead, logs }))
}

async fn update_lead_status(
    State(state): State<AppState>,
    auth: Authorized<LeadUpdate>,
    Path(lead_id): Path<i64>,
    Json(request): Json<UpdateLeadStatus>,
) -> Result<Json<lead::Model>> {
    let lead = leads::get(&state.db, lead_id).await?;
    auth.ensure_owner(lead.assigned_to_id)?;
    let previous = lead.status;

    let updated = leads::update_status(&state.db, lead_id, request.status).await?;

    state
        .audit
        .record(
            AuditAction::LeadUpdated,
            ResourceType::Lead,
            lead_id,
            Some(auth.user()),
            Some(serde_json::json!({ "from": previous, "to": updated.status })),
        )
        .await;

    Ok(Json(updated))
}

async fn add_lead_log(
    State(state): State<AppState>,
    auth: Authorized<LeadUpdate>,
    Path(lead_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CreateLeadLog>,
) -> Result<(StatusCode, Json<lead_log::Model>)> {
    let lead = leads::get(&state.db, lead_id).await?;
    auth.ensure_owner(lead.assigned_to_id)?;

    let entry = leads::add_log(
        &state.db,
        lead_id,
        request.note,
        request.next_follow_up,
        auth.user_id(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Create the student account for a lead, optionally enrolling it
async fn convert_lead(
    State(state): State<AppState>,
    auth: Authorized<LeadConvert>,
    Path(lead_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<ConvertLead>,
) -> Result<(StatusCode, Json<Conversion>)> {
    let lead = leads::get(&state.db, lead_id).await?;
    auth.ensure_owner(lead.assigned_to_id)?;

    let conversion = match leads::convert(
        &state.db,
        lead_id,
        auth.user(),
        &request.temporary_password,
        request.batch_id,
    )
    .await
    {
        Ok(conversion) => conversion,
        Err(e) => {
            state
                .audit
                .record_failure(
                    AuditAction::LeadConverted,
                    ResourceType::Lead,
                    Some(auth.user()),
                    Some(serde_json::json!({ "lead_id": lead_id })),
                    &e.to_string(),
                )
                .await;
            return Err(e);
        }
    };

    state
        .audit
        .record(
            AuditAction::LeadConverted,
            ResourceType::Lead,
            lead_id,
            Some(auth.user()),
            Some(serde_json::json!({
                "student_id": conversion.student.id,
                "enrollment_id": conversion.enrollment.as_ref().map(|e| e.id),
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(conversion)))
}
