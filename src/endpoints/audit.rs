use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::permissions::{AuditView, Authorized};
use crate::services::audit::{AuditLogPage, AuditLogQuery};
use crate::state::AppState;

/// Create audit routes
pub fn audit_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_audit_logs))
        .with_state(state)
}

/// List audit logs with filtering and pagination
async fn list_audit_logs(
    State(state): State<AppState>,
    _auth: Authorized<AuditView>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogPage>> {
    Ok(Json(state.audit.list(&query).await?))
}
