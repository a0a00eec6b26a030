/// Health check endpoint
///
/// Provides a simple health check endpoint that verifies:
/// - The server is running
/// - Database connectivity
/// - Cache connectivity, when a cache is configured
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "cache": "disabled",
///   "pool": { "total_connections": 2, "idle_connections": 1, "active_connections": 1 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use taskboard_shared::db::pool::{get_pool_stats, health_check as db_health_check, PoolStats};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status: `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Cache status: `connected`, `disconnected` or `disabled`
    pub cache: String,

    pub pool: PoolStats,
}

/// Health check handler
///
/// Always answers 200; a failed dependency shows up as `degraded`. A cache
/// outage does not degrade the service since reads fall back to the database.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_status = match db_health_check(&state.db).await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "disconnected"
        }
    };

    let cache_status = match &state.cache {
        None => "disabled",
        Some(cache) => match cache.client().ping().await {
            Ok(true) => "connected",
            Ok(false) => "disconnected",
            Err(e) => {
                tracing::warn!(error = %e, "Cache health check failed");
                "disconnected"
            }
        },
    };

    Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
        cache: cache_status.to_string(),
        pool: get_pool_stats(&state.db),
    })
}

/// `GET /api`
pub async fn api_root() -> Json<Value> {
    Json(json!({ "message": "This is api Route" }))
}
