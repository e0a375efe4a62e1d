/// Health check endpoint
///
/// Verifies that the server is running and the document store answers a
/// `SELECT TOP 1` query.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// GET /v1/health
/// ```
///
/// # Response
///
/// `200 OK` when the store answers:
///
/// ```json
/// {
///   "ok": true,
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "timestamp": "2024-03-05T11:00:00Z"
/// }
/// ```
///
/// `500 Internal Server Error` otherwise, with `ok: false`,
/// `status: "unhealthy"`, `database: "disconnected"` and an `error` message.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,

    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    pub timestamp: DateTime<Utc>,

    /// Why the store check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                status: "healthy".to_string(),
                version,
                database: "connected".to_string(),
                timestamp: Utc::now(),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    ok: false,
                    status: "unhealthy".to_string(),
                    version,
                    database: "disconnected".to_string(),
                    timestamp: Utc::now(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
