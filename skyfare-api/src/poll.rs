use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use skyfare_search::poll;
use skyfare_shared::ProgressFrame;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PollParams {
    #[serde(default)]
    pub query_id: String,
    pub last_seen_index: Option<String>,
}

/// GET /api/result/longpoll
/// Stateless long poll over the replay log: returns the next entry past the
/// client's cursor, or a timeout frame with the cursor unchanged.
pub async fn longpoll_handler(
    State(state): State<AppState>,
    Query(params): Query<PollParams>,
) -> Result<Json<ProgressFrame>, AppError> {
    if params.query_id.is_empty() {
        return Err(AppError::BadRequest("query_id is required".to_string()));
    }

    let last_seen_index = params
        .last_seen_index
        .as_deref()
        .and_then(|idx| idx.parse::<u64>().ok())
        .unwrap_or(0);

    let frame = poll::poll(
        state.store.as_ref(),
        &params.query_id,
        last_seen_index,
        &state.rules,
    )
    .await?;

    Ok(Json(frame))
}
