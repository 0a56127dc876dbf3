//! Health check endpoints
//!
//! This module provides health check endpoints for monitoring
//! and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub upstream_configured: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness probe endpoint
///
/// Ready means the config is loaded and the upstream client has a key.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = ReadinessChecks {
        config_loaded: true,
        upstream_configured: state.check_upstream_health(),
    };

    let ready = checks.config_loaded && checks.upstream_configured;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if !ready {
        tracing::warn!(checks = ?checks, "Service not ready");
    }

    (status, Json(ReadinessResponse { ready, checks }))
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    // If we can respond, we're alive
    Json(LivenessResponse { alive: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_state() -> AppState {
        AppState::new(Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check(State(test_state())).await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.environment, "development");
    }

    #[tokio::test]
    async fn test_readiness_with_key() {
        let (status, response) = readiness(State(test_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.0.ready);
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = liveness().await;
        assert!(response.0.alive);
    }
}
