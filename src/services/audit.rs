use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::db::DbConn;
use crate::error::Result;
use crate::models::audit_log::{self, AuditAction, ResourceType};
use crate::models::prelude::AuditLog;
use crate::models::user;

/// Audit service for recording lifecycle events
#[derive(Clone)]
pub struct AuditService {
    db: DbConn,
}

/// Query parameters for listing audit entries
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub user_id: Option<i64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub logs: Vec<audit_log::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl AuditService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Log an audit event
    #[allow(clippy::too_many_arguments)]
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
        success: bool,
        error_message: Option<String>,
    ) -> Result<()> {
        let log_entry = audit_log::ActiveModel {
            timestamp: Set(chrono::Utc::now()),
            user_id: Set(actor.map(|u| u.id)),
            user_email: Set(actor.map(|u| u.email.clone())),
            action: Set(action.to_string()),
            resource_type: Set(resource_type.to_string()),
            resource_id: Set(resource_id),
            details: Set(details.map(|d| d.to_string())),
            success: Set(success),
            error_message: Set(error_message),
            ..Default::default()
        };

        log_entry.insert(&self.db).await?;
        Ok(())
    }

    /// Record a successful action. Audit failures never fail the caller.
    pub async fn record(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: impl ToString,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
    ) {
        if let Err(e) = self
            .log(
                action,
                resource_type,
                Some(resource_id.to_string()),
                actor,
                details,
                true,
                None,
            )
            .await
        {
            tracing::warn!("Failed to write audit log for {}: {}", action, e);
        }
    }

    /// Record a failed action. Audit failures never fail the caller.
    pub async fn record_failure(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
        error: &str,
    ) {
        if let Err(e) = self
            .log(
                action,
                resource_type,
                None,
                actor,
                details,
                false,
                Some(error.to_string()),
            )
            .await
        {
            tracing::warn!("Failed to write audit log for {}: {}", action, e);
        }
    }

    /// Page through audit entries, newest first
    pub async fn list(&self, query: &AuditLogQuery) -> Result<AuditLogPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);

        let mut select = AuditLog::find();
        if let Some(ref action) = query.action {
            select = select.filter(audit_log::Column::Action.eq(action.as_str()));
        }
        if let Some(ref resource_type) = query.resource_type {
            select = select.filter(audit_log::Column::ResourceType.eq(resource_type.as_str()));
        }
        if let Some(ref resource_id) = query.resource_id {
            select = select.filter(audit_log::Column::ResourceId.eq(resource_id.as_str()));
        }
        if let Some(user_id) = query.user_id {
            select = select.filter(audit_log::Column::UserId.eq(user_id));
        }

        let paginator = select
            .order_by_desc(audit_log::Column::Timestamp)
            .order_by_desc(audit_log::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let logs = paginator.fetch_page(page - 1).await?;

        Ok(AuditLogPage {
            logs,
            total,
            page,
            per_page,
        })
    }
}
