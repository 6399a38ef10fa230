//! API handlers for the compliance server
//!
//! Provides REST endpoints for:
//! - Compliance checking
//! - Health

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared_types::EvaluationResult;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub strategy: String,
    pub rules: usize,
}

/// Handler: GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-server",
        version: env!("CARGO_PKG_VERSION"),
        strategy: state.strategy.to_string(),
        rules: state.engine.rules().len(),
    })
}

/// Compliance check request
#[derive(Deserialize, Default)]
pub struct ComplianceRequest {
    /// Contract text to check; missing text is treated as empty
    #[serde(default)]
    pub text: String,
}

/// Handler: POST /check_compliance
///
/// A missing or malformed body is checked as empty text.
pub async fn handle_check_compliance(
    State(state): State<AppState>,
    body: Option<Json<ComplianceRequest>>,
) -> Result<Json<EvaluationResult>, ServerError> {
    let text = body.map(|Json(req)| req.text).unwrap_or_default();
    info!("Compliance request: {} chars", text.len());

    // QA inference blocks, keep it off the async workers
    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || engine.evaluate(&text)).await?;

    debug!(
        violations = result.violation_count(),
        errors = result.error_count(),
        compliant = result.violations.is_compliant(),
        "Compliance check complete"
    );

    Ok(Json(result))
}
