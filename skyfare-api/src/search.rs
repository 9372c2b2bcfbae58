use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skyfare_shared::SearchRequest;
use tracing::info;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub trip_type: String,
    #[serde(default)]
    pub departure_date: String,
    pub return_date: Option<String>,
    pub pax: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query_id: String,
    pub ws_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelParams {
    #[serde(default)]
    pub query_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/search
/// Kick off a fan-out search and hand back the id to follow it with.
pub async fn start_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    // Tolerate absent or garbage pax values rather than rejecting.
    let pax = params
        .pax
        .as_deref()
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    let request = SearchRequest {
        origin: params.from,
        destination: params.to,
        trip_type: params.trip_type,
        departure_date: params.departure_date,
        return_date: params.return_date,
        pax,
    };

    let query_id = state.orchestrator.start(request).await?;
    info!("Search accepted: {}", query_id);

    let ws_url = format!(
        "ws://localhost:{}/ws/result/stream?query_id={}",
        state.port, query_id
    );
    Ok(Json(SearchResponse { query_id, ws_url }))
}

/// POST /api/search/cancel
/// Idempotent: cancelling an unknown or already-finished search is a no-op.
pub async fn cancel_search(
    State(state): State<AppState>,
    Query(params): Query<CancelParams>,
) -> Result<Json<Value>, AppError> {
    if params.query_id.is_empty() {
        return Err(AppError::BadRequest("query_id is required".to_string()));
    }

    state.orchestrator.cancel(&params.query_id).await?;
    Ok(Json(json!({ "status": "cancelled" })))
}
