//! Application bootstrapper
//!
//! Handles all initialization and setup for the Cohortly backend.

use std::net::SocketAddr;

use axum::{http::HeaderValue, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::middleware::add_security_headers;
use crate::services::bootstrap::ensure_admin_user;
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Cohortly backend v{}", env!("CARGO_PKG_VERSION"));

    if CONFIG.auth.uses_dev_secret() {
        tracing::warn!("COHORTLY_JWT_SECRET not set, using the development signing secret");
    }

    let state = init_services().await?;
    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("cohortly={},tower_http=info", CONFIG.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if CONFIG.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

/// Connect to the database and seed the bootstrap admin
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect().await?;

    if let (Some(email), Some(password)) = (&CONFIG.auth.admin_email, &CONFIG.auth.admin_password)
    {
        ensure_admin_user(&conn, email, password).await?;
    }

    Ok(AppState::new(conn))
}

/// Build the router with tracing and CORS layers
pub fn create_app(state: AppState) -> Router {
    endpoints::create_router(state)
        .layer(axum::middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = CONFIG
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
