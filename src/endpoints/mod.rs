pub mod assignments;
pub mod audit;
pub mod auth;
pub mod bootcamps;
pub mod certificates;
pub mod enrollments;
pub mod extractors;
pub mod leads;
pub mod users;

use axum::{middleware as axum_middleware, routing::get, Json, Router};

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/version", get(get_version))
        .nest("/auth", auth::auth_routes(state.clone()))
        .nest(
            "/api/certificates",
            certificates::certificates_routes(state.clone()),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}

/// API routes under /api/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/users", users::users_routes(state.clone()))
        .nest("/bootcamps", bootcamps::bootcamps_routes(state.clone()))
        .nest("/enrollments", enrollments::enrollments_routes(state.clone()))
        .nest("/leads", leads::leads_routes(state.clone()))
        .nest(
            "/assignments",
            assignments::assignments_routes(state.clone()),
        )
        .nest(
            "/submissions",
            assignments::submissions_routes(state.clone()),
        )
        .nest("/audit", audit::audit_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "build_time": CONFIG.build_time,
    }))
}
