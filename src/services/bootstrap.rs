use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::db::DbConn;
use crate::error::Result;
use crate::models::prelude::*;
use crate::models::user::{self, UserRole};
use crate::services::security::hash_password;

/// Create the bootstrap admin account if no user owns that email yet.
///
/// Returns `true` when an account was created.
pub async fn ensure_admin_user(db: &DbConn, email: &str, password: &str) -> Result<bool> {
    let email = email.trim().to_lowercase();

    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    if let Some(existing) = existing {
        if existing.role != UserRole::Admin {
            tracing::warn!(
                "Bootstrap admin email {} belongs to a {} account, leaving it untouched",
                email,
                existing.role
            );
        }
        return Ok(false);
    }

    let now = Utc::now();
    user::ActiveModel {
        email: Set(email.clone()),
        full_name: Set("Administrator".to_string()),
        phone: Set(None),
        hashed_password: Set(hash_password(password)?),
        role: Set(UserRole::Admin),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created bootstrap admin {}", email);
    Ok(true)
}
