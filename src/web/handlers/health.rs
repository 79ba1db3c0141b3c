//! # Health Check Handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub database: &'static str,
    pub timestamp: String,
}

/// Health check endpoint: GET /health
///
/// Reports `degraded` with 503 when a configured database does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        None => "not_configured",
        Some(connection) => match connection.health_check().await {
            Ok(true) => "ok",
            Ok(false) => "unavailable",
            Err(e) => {
                error!(error = %e, "Database health check failed");
                "unavailable"
            }
        },
    };

    let (status_code, status) = if database == "unavailable" {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            environment: state.environment.clone(),
            database,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}
