use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyfare_core::sources;
use skyfare_shared::{ResultEvent, SearchRequest};
use skyfare_store::app_config::SearchRules;
use skyfare_store::SearchStore;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::completion::CompletionCounter;
use crate::keys;

pub struct SourceWorker {
    pub store: Arc<dyn SearchStore>,
    pub query_id: String,
    pub source: &'static str,
    pub request: SearchRequest,
    pub counter: Arc<CompletionCounter>,
    pub cancel: CancellationToken,
    pub rules: SearchRules,
}

impl SourceWorker {
    /// Produce `num_events` results with jittered delays, publishing each
    /// one to the result channel. Honors cancellation at every delay
    /// boundary; a failed publish or a bad event skips that event only.
    pub async fn run(self, num_events: u32) {
        let mut rng = StdRng::from_entropy();
        let channel = keys::result_channel(&self.query_id);
        let ttl = self.rules.result_ttl();

        for seq in 0..num_events {
            let jitter = Duration::from_millis(
                rng.gen_range(self.rules.delay_min_ms..=self.rules.delay_max_ms),
            );
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Cancelled fetching: {}", self.source);
                    return;
                }
                _ = sleep(jitter) => {}
            }

            let flight =
                sources::generate_flight(&mut rng, self.source, &self.request, seq as usize);
            let payload = match serde_json::to_string(&ResultEvent::Result(flight)) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Skipping unencodable event from {}: {}", self.source, e);
                    continue;
                }
            };

            if let Err(e) = self.store.publish(&channel, &payload).await {
                warn!("Publish failed for {} event {}: {}", self.source, seq, e);
            }
            if let Err(e) = self
                .store
                .set_with_expiry(&keys::scratch_key(&self.query_id, self.source, seq), &payload, ttl)
                .await
            {
                debug!("Scratch write failed for {} event {}: {}", self.source, seq, e);
            }

            let (total, crossed) = self.counter.record();
            debug!(
                "Flight result from {} ({}/{})",
                self.source,
                total,
                self.counter.expected()
            );

            if crossed {
                info!(
                    "Sending completion message for query {} (Total: {})",
                    self.query_id, total
                );
                match serde_json::to_string(&ResultEvent::Completed {
                    total_flights: total,
                }) {
                    Ok(done) => {
                        if let Err(e) = self.store.publish(&channel, &done).await {
                            warn!("Failed to publish completion for {}: {}", self.query_id, e);
                        }
                    }
                    Err(e) => warn!("Failed to encode completion: {}", e),
                }
            }
        }
    }
}
