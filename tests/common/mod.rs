//! Test helpers shared by the integration suites.
//!
//! Every test gets its own in-memory SQLite database with the full schema
//! applied through the migrator.

#![allow(dead_code)]

use std::sync::Once;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use cohortly::endpoints::create_router;
use cohortly::models::batch::{self, BatchStatus};
use cohortly::models::bootcamp::{self, BootcampMode};
use cohortly::models::enrollment::{self, EnrollmentStatus};
use cohortly::models::milestone;
use cohortly::models::user::{self, UserRole};
use cohortly::services::enrollment as ledger;
use cohortly::services::staff;
use cohortly::services::security::create_access_token;
use cohortly::state::AppState;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

static INIT: Once = Once::new();

/// Keep bcrypt cheap and the signing secret fixed for the whole test binary
fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("COHORTLY_BCRYPT_COST", "4");
        std::env::set_var("COHORTLY_JWT_SECRET", "integration-test-secret");
    });
}

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    init_test_env();
    // A single connection: every pooled connection would get its own empty database
    cohortly::db::connect_with_url("sqlite::memory:", 1)
        .await
        .expect("Failed to create test database")
}

pub async fn create_test_state() -> AppState {
    AppState::new(create_test_db().await)
}

pub fn test_app(state: &AppState) -> Router {
    create_router(state.clone())
}

pub async fn create_test_user_with_role(
    db: &DatabaseConnection,
    email: &str,
    role: UserRole,
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        email: Set(email.to_string()),
        full_name: Set(format!("Test {}", role)),
        phone: Set(None),
        hashed_password: Set(bcrypt::hash(TEST_PASSWORD, 4).unwrap()),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

/// A bootcamp with one batch and `milestones` ordered checkpoints
pub struct Curriculum {
    pub bootcamp: bootcamp::Model,
    pub batch: batch::Model,
    pub milestones: Vec<milestone::Model>,
}

pub async fn create_bootcamp(db: &DatabaseConnection, title: &str) -> bootcamp::Model {
    let now = Utc::now();
    bootcamp::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("{} from zero to production", title)),
        mode: Set(BootcampMode::Live),
        price_cents: Set(250_000),
        duration_weeks: Set(12),
        created_by_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create bootcamp")
}

pub async fn create_batch(
    db: &DatabaseConnection,
    bootcamp_id: i64,
    name: &str,
    capacity: i32,
) -> batch::Model {
    let now = Utc::now();
    batch::ActiveModel {
        bootcamp_id: Set(bootcamp_id),
        name: Set(name.to_string()),
        start_date: Set(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()),
        end_date: Set(NaiveDate::from_ymd_opt(2026, 4, 3).unwrap()),
        capacity: Set(capacity),
        status: Set(BatchStatus::Upcoming),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create batch")
}

pub async fn create_milestone(
    db: &DatabaseConnection,
    bootcamp_id: i64,
    order: i32,
) -> milestone::Model {
    milestone::ActiveModel {
        bootcamp_id: Set(bootcamp_id),
        title: Set(format!("Module {}", order)),
        description: Set(None),
        order: Set(order),
        percentage_weight: Set(25),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create milestone")
}

pub async fn seed_curriculum(db: &DatabaseConnection, milestones: i32) -> Curriculum {
    let bootcamp = create_bootcamp(db, "Full-Stack Web").await;
    let batch = create_batch(db, bootcamp.id, "Winter 2026", 30).await;

    let mut created = Vec::new();
    for order in 1..=milestones {
        created.push(create_milestone(db, bootcamp.id, order).await);
    }

    Curriculum {
        bootcamp,
        batch,
        milestones: created,
    }
}

pub async fn enroll(
    db: &DatabaseConnection,
    student_id: i64,
    batch_id: i64,
    status: EnrollmentStatus,
) -> enrollment::Model {
    ledger::enroll(db, student_id, batch_id, Some(status))
        .await
        .expect("Failed to enroll student")
}

/// Create an instructor or mentor already attached to `batch_id`
pub async fn create_batch_staff(
    db: &DatabaseConnection,
    email: &str,
    role: UserRole,
    batch_id: i64,
) -> user::Model {
    let user = create_test_user_with_role(db, email, role).await;
    staff::assign(db, batch_id, user.id)
        .await
        .expect("Failed to assign staff");
    user
}

pub fn token_for(user: &user::Model) -> String {
    init_test_env();
    create_access_token(user).expect("Failed to create token")
}

/// Drive one request through the router and decode the JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, json)
}
