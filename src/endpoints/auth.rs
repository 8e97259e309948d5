use axum::{extract::State, routing::post, Json, Router};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::config::CONFIG;
use crate::endpoints::extractors::ValidatedJson;
use crate::error::{AppError, Result};
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::{LoginRequest, TokenResponse};
use crate::services::{create_access_token, verify_password};
use crate::state::AppState;

/// Create auth routes
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .with_state(state)
}

/// Exchange email and password for a bearer token
async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let email = request.email.trim().to_lowercase();

    let found_user = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?;

    let found_user = match found_user {
        Some(u) if verify_password(&request.password, &u.hashed_password) => u,
        other => {
            state
                .audit
                .record_failure(
                    AuditAction::LoginFailed,
                    ResourceType::Session,
                    other.as_ref(),
                    Some(serde_json::json!({ "email": email })),
                    "Invalid credentials",
                )
                .await;
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    if !found_user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    let access_token = create_access_token(&found_user)?;

    state
        .audit
        .record(
            AuditAction::Login,
            ResourceType::Session,
            found_user.id,
            Some(&found_user),
            None,
        )
        .await;

    tracing::info!(user_id = found_user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: CONFIG.auth.access_token_ttl,
        user: found_user.into(),
    }))
}
