use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyfare_core::{query, sources};
use skyfare_shared::{ResultEvent, SearchRequest};
use skyfare_store::app_config::SearchRules;
use skyfare_store::SearchStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bridge::BridgeListener;
use crate::completion::CompletionCounter;
use crate::worker::SourceWorker;
use crate::{keys, SearchResult};

struct ActiveSearch {
    cancel: CancellationToken,
    bridge: BridgeListener,
    /// Per-source event counts drawn at start, kept for scratch cleanup.
    planned: Vec<(&'static str, u32)>,
}

/// Owns the lifecycle of every in-flight search: id allocation, the bridge
/// listener, one worker per source, completion, and cancellation.
pub struct SearchOrchestrator {
    store: Arc<dyn SearchStore>,
    rules: SearchRules,
    active: Arc<Mutex<HashMap<String, ActiveSearch>>>,
}

impl SearchOrchestrator {
    pub fn new(store: Arc<dyn SearchStore>, rules: SearchRules) -> Self {
        Self {
            store,
            rules,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a search and return its query id.
    ///
    /// The whole start-up runs under the session lock, so a concurrent
    /// start for the same id cannot race a second bridge listener into
    /// existence; it just gets the id back.
    pub async fn start(&self, request: SearchRequest) -> SearchResult<String> {
        let query_id = query::generate_query_id(&request);

        let mut active = self.active.lock().await;
        if active.contains_key(&query_id) {
            return Ok(query_id);
        }

        let cancel = CancellationToken::new();

        // The bridge must be subscribed before any worker can publish,
        // otherwise early events never reach the replay log.
        let bridge = BridgeListener::start(
            self.store.clone(),
            &query_id,
            &self.rules,
            cancel.child_token(),
        )
        .await?;

        let mut rng = StdRng::from_entropy();
        let planned: Vec<(&'static str, u32)> = sources::SOURCES
            .iter()
            .map(|source| {
                let count = rng.gen_range(
                    self.rules.flights_per_source_min..=self.rules.flights_per_source_max,
                );
                (*source, count)
            })
            .collect();
        let expected: u64 = planned.iter().map(|(_, count)| *count as u64).sum();
        let counter = Arc::new(CompletionCounter::new(expected));

        info!(
            "Starting search {} ({} sources, {} expected results)",
            query_id,
            planned.len(),
            expected
        );

        // Register the session before any worker runs; the lock is held
        // until this function returns, so the reaper cannot observe a
        // half-started session.
        active.insert(
            query_id.clone(),
            ActiveSearch {
                cancel: cancel.clone(),
                bridge,
                planned: planned.clone(),
            },
        );

        let mut workers = Vec::with_capacity(planned.len());
        for (source, count) in planned {
            let worker = SourceWorker {
                store: self.store.clone(),
                query_id: query_id.clone(),
                source,
                request: request.clone(),
                counter: counter.clone(),
                cancel: cancel.child_token(),
                rules: self.rules.clone(),
            };
            workers.push(tokio::spawn(worker.run(count)));
        }

        // Reap the session once every worker has finished and the bridge
        // has drained the terminal event.
        let registry = self.active.clone();
        let id = query_id.clone();
        tokio::spawn(async move {
            for worker in workers {
                let _ = worker.await;
            }
            let session = registry.lock().await.remove(&id);
            if let Some(session) = session {
                session.bridge.join().await;
                info!("Search {} finished", id);
            }
        });

        Ok(query_id)
    }

    /// Cancel a running search. Unknown or already-finished ids are a
    /// no-op; calling twice behaves exactly like calling once.
    pub async fn cancel(&self, query_id: &str) -> SearchResult<bool> {
        let session = self.active.lock().await.remove(query_id);
        let Some(session) = session else {
            return Ok(false);
        };

        info!("Cancelling search {}", query_id);

        // 1. Stop producers and the bridge; workers notice at their next
        //    delay boundary.
        session.cancel.cancel();
        session.bridge.join().await;

        // 2. Tell live subscribers.
        let payload = serde_json::to_string(&ResultEvent::Cancelled)?;
        if let Err(e) = self
            .store
            .publish(&keys::result_channel(query_id), &payload)
            .await
        {
            warn!("Failed to broadcast cancellation for {}: {}", query_id, e);
        }

        // 3. The bridge is already gone, so write the cancellation into the
        //    replay log directly for poll clients.
        let ttl = self.rules.result_ttl();
        self.store
            .append_to_list(&keys::results_key(query_id), &payload)
            .await?;
        self.store.expire(&keys::results_key(query_id), ttl).await?;
        self.store
            .incr_with_expiry(&keys::count_key(query_id), ttl)
            .await?;

        // 4. Clear per-event scratch state; the log and count age out on
        //    their own TTL so late pollers still see history.
        for (source, count) in &session.planned {
            for seq in 0..*count {
                if let Err(e) = self
                    .store
                    .delete(&keys::scratch_key(query_id, source, seq))
                    .await
                {
                    warn!("Failed to clear scratch state for {}: {}", query_id, e);
                }
            }
        }

        Ok(true)
    }

    /// Whether a search is currently running.
    pub async fn is_active(&self, query_id: &str) -> bool {
        self.active.lock().await.contains_key(query_id)
    }
}
