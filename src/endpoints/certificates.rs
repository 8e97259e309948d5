use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::services::certificate::{self, CertificateVerification};
use crate::state::AppState;

/// Public certificate verification routes (no auth)
pub fn certificates_routes(state: AppState) -> Router {
    Router::new()
        .route("/verify/{code}", get(verify_certificate))
        .with_state(state)
}

async fn verify_certificate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CertificateVerification>> {
    Ok(Json(certificate::verify(&state.db, &code).await?))
}
