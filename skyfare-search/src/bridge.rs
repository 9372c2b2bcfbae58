use std::sync::Arc;

use skyfare_shared::ResultEvent;
use skyfare_store::app_config::SearchRules;
use skyfare_store::SearchStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::keys;
use crate::SearchResult;

/// Mirrors every event on a search's pub/sub channel into the durable
/// replay log, making ephemeral broadcasts visible to poll clients that
/// were not subscribed at publish time.
///
/// At most one listener runs per query id; the orchestrator's session map
/// enforces that.
pub struct BridgeListener {
    task: JoinHandle<()>,
}

impl BridgeListener {
    /// Subscribe and start mirroring. The subscription is live before this
    /// returns, so callers can order worker start-up after it — a publish
    /// racing ahead of this subscription would be lost to the log.
    pub async fn start(
        store: Arc<dyn SearchStore>,
        query_id: &str,
        rules: &SearchRules,
        cancel: CancellationToken,
    ) -> SearchResult<Self> {
        let mut subscription = store.subscribe(&keys::result_channel(query_id)).await?;

        let results_key = keys::results_key(query_id);
        let count_key = keys::count_key(query_id);
        let ttl = rules.result_ttl();
        let id = query_id.to_string();

        let task = tokio::spawn(async move {
            info!("Started result listener for query {}", id);
            loop {
                let payload = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Result listener cancelled for query {}", id);
                        break;
                    }
                    msg = subscription.recv() => match msg {
                        Some(payload) => payload,
                        None => {
                            debug!("Result channel closed for query {}", id);
                            break;
                        }
                    },
                };

                // Mirror verbatim; the log is payload-agnostic and readers
                // skip entries they cannot decode.
                if let Err(e) = store.append_to_list(&results_key, &payload).await {
                    error!("Failed to mirror event for query {}: {}", id, e);
                    continue;
                }
                if let Err(e) = store.expire(&results_key, ttl).await {
                    error!("Failed to refresh log expiry for query {}: {}", id, e);
                }
                if let Err(e) = store.incr_with_expiry(&count_key, ttl).await {
                    error!("Failed to bump received count for query {}: {}", id, e);
                }

                match serde_json::from_str::<ResultEvent>(&payload) {
                    Ok(ResultEvent::Completed { .. }) | Ok(ResultEvent::Cancelled) => {
                        debug!("Result listener finished for query {}", id);
                        break;
                    }
                    Ok(ResultEvent::Result(_)) => {}
                    Err(e) => debug!("Mirrored unrecognized payload for query {}: {}", id, e),
                }
            }
            // Log and count stay behind for late pollers until their TTL
            // runs out.
        });

        Ok(Self { task })
    }

    /// Wait for the mirror task to drain and exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
