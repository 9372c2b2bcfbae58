//! Stateless polling over the replay log.
//!
//! Each call carries the client's cursor. The call returns the earliest
//! entry past the cursor, or waits — re-checking on a fixed interval, never
//! holding shared state — until something arrives or the ceiling elapses.

use skyfare_core::progress;
use skyfare_shared::{ProgressFrame, ResultEvent};
use skyfare_store::app_config::SearchRules;
use skyfare_store::SearchStore;
use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::keys;
use crate::SearchResult;

pub async fn poll(
    store: &dyn SearchStore,
    query_id: &str,
    last_seen_index: u64,
    rules: &SearchRules,
) -> SearchResult<ProgressFrame> {
    let deadline = Instant::now() + rules.poll_ceiling();

    loop {
        if let Some(frame) = next_frame(store, query_id, last_seen_index, rules).await? {
            return Ok(frame);
        }

        if Instant::now() >= deadline {
            let received = read_count(store, query_id).await?;
            return Ok(progress::poll_timeout_frame(
                received,
                rules.expected_flights,
                last_seen_index,
            ));
        }

        sleep(rules.poll_interval()).await;
    }
}

/// One non-blocking check of the log. `Ok(None)` means nothing new past the
/// cursor yet.
async fn next_frame(
    store: &dyn SearchStore,
    query_id: &str,
    last_seen_index: u64,
    rules: &SearchRules,
) -> SearchResult<Option<ProgressFrame>> {
    // Unknown ids read as zero counts and fall through to the wait loop,
    // indistinguishable from a just-started search.
    let received = read_count(store, query_id).await?;
    if received <= last_seen_index {
        return Ok(None);
    }

    let entries = store
        .list_range(&keys::results_key(query_id), last_seen_index as i64, -1)
        .await?;

    let mut cursor = last_seen_index;
    for entry in entries {
        cursor += 1;
        match serde_json::from_str::<ResultEvent>(&entry) {
            Ok(ResultEvent::Cancelled) => {
                let mut frame = progress::cancelled_frame();
                frame.last_seen_index = Some(cursor);
                return Ok(Some(frame));
            }
            Ok(ResultEvent::Completed { total_flights }) => {
                let mut frame = progress::completed_frame(total_flights);
                frame.last_seen_index = Some(cursor);
                return Ok(Some(frame));
            }
            Ok(ResultEvent::Result(flight)) => {
                let mut frame =
                    progress::result_frame(flight, received, rules.expected_flights);
                frame.last_seen_index = Some(cursor);
                return Ok(Some(frame));
            }
            Err(e) => {
                // Skip the entry but keep the cursor moving so the client
                // never re-reads it.
                warn!(
                    "Skipping malformed log entry {} for query {}: {}",
                    cursor - 1,
                    query_id,
                    e
                );
            }
        }
    }

    Ok(None)
}

async fn read_count(store: &dyn SearchStore, query_id: &str) -> SearchResult<u64> {
    let raw = store.get(&keys::count_key(query_id)).await?;
    Ok(raw.and_then(|v| v.parse::<u64>().ok()).unwrap_or(0))
}
