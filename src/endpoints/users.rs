use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::endpoints::extractors::ValidatedJson;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{Authenticated, Authorized, UsersManage, UsersView};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::{CreateUser, UserListParams, UserResponse};
use crate::services::hash_password;
use crate::state::AppState;

/// Create users routes
pub fn users_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_current_user))
        .with_state(state)
}

async fn get_current_user(auth: Authenticated) -> Json<UserResponse> {
    Json(auth.0.into())
}

/// List users, optionally filtered by role
async fn list_users(
    State(state): State<AppState>,
    _auth: Authorized<UsersView>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<UserResponse>>> {
    let mut query = User::find();
    if let Some(role) = params.role {
        query = query.filter(user::Column::Role.eq(role));
    }

    let users = query
        .order_by_asc(user::Column::Id)
        .offset(params.skip.unwrap_or(0))
        .limit(params.limit.unwrap_or(100).min(500))
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a user account (admin only)
async fn create_user(
    State(state): State<AppState>,
    auth: Authorized<UsersManage>,
    ValidatedJson(request): ValidatedJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let hashed_password = hash_password(&request.password)?;
    let now = Utc::now();

    let created = user::ActiveModel {
        email: Set(request.email.trim().to_lowercase()),
        full_name: Set(request.full_name),
        phone: Set(request.phone),
        hashed_password: Set(hashed_password),
        role: Set(request.role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "A user with this email already exists"))?;

    state
        .audit
        .record(
            AuditAction::UserCreated,
            ResourceType::User,
            created.id,
            Some(auth.user()),
            Some(serde_json::json!({ "role": created.role })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created.into())))
}
