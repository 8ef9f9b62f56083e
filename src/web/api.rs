//! HTTP handlers. Each delegates to a service and maps its error straight
//! through [`AppError`]'s response mapping.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{EpgQueryResponse, IngestOutcome};

use super::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    #[serde(default)]
    pub force: bool,
}

/// Trigger one ingest run. Requires the configured bearer token, when one
/// is set. `?force=true` bypasses change detection.
pub async fn trigger_ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    headers: HeaderMap,
) -> Result<Json<IngestOutcome>, AppError> {
    authorize(&headers, &state.config.ingest.token)?;
    let outcome = state.ingest.run(params.force).await?;
    Ok(Json(outcome))
}

/// Last persisted ingest state plus the live phase of any in-flight run.
pub async fn ingest_status(State(state): State<AppState>) -> Json<Value> {
    let persisted = state
        .ingest
        .load_state()
        .map(|s| json!(s))
        .unwrap_or_else(|| json!({}));
    let phase = state.ingest.phase().await;
    Json(json!({ "state": persisted, "phase": phase }))
}

#[derive(Debug, Deserialize)]
pub struct EpgParams {
    pub hours: Option<i64>,
}

/// Correlate the configured channel list against the guide.
pub async fn query_epg(
    State(state): State<AppState>,
    Query(params): Query<EpgParams>,
) -> Result<Json<EpgQueryResponse>, AppError> {
    let channels = state.channels.channels().await?;
    let response = state.epg.query(channels, params.hours).await?;
    Ok(Json(response))
}

/// Bearer check against the configured token. An empty configured token
/// leaves the endpoint open.
fn authorize(headers: &HeaderMap, token: &str) -> Result<(), AppError> {
    if token.is_empty() {
        return Ok(());
    }
    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match provided {
        Some(p) if p == token => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}
