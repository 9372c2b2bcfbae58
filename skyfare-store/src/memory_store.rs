use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::store::{SearchStore, StoreError, Subscription};

const TOPIC_CAPACITY: usize = 256;

struct Expiring<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Expiring<T> {
    fn live(&self) -> bool {
        self.expires_at.map(|at| at > Instant::now()).unwrap_or(true)
    }
}

/// In-process store and broker with the same semantics as the Redis
/// backend: ephemeral per-topic fan-out, gap-free lists, TTL'd keys.
/// Drives the test suite and local development without a Redis instance.
#[derive(Default)]
pub struct MemoryStore {
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
    lists: RwLock<HashMap<String, Expiring<Vec<String>>>>,
    kv: RwLock<HashMap<String, Expiring<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic_sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.lock().expect("topics lock poisoned");
        topics
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl SearchStore for MemoryStore {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), StoreError> {
        // A send error just means nobody is subscribed right now; the bus
        // does not buffer.
        let _ = self.topic_sender(channel).send(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let mut source = self.topic_sender(channel).subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let channel_name = channel.to_string();

        let forward = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber lagged on {}, skipped {}", channel_name, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(rx, forward))
    }

    async fn append_to_list(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        let mut lists = self.lists.write().expect("lists lock poisoned");
        let entry = lists.entry(key.to_string()).or_insert_with(|| Expiring {
            value: Vec::new(),
            expires_at: None,
        });
        if !entry.live() {
            entry.value.clear();
            entry.expires_at = None;
        }
        entry.value.push(payload.to_string());
        Ok(())
    }

    async fn list_range(&self, key: &str, from: i64, to: i64) -> Result<Vec<String>, StoreError> {
        let lists = self.lists.read().expect("lists lock poisoned");
        let Some(entry) = lists.get(key).filter(|e| e.live()) else {
            return Ok(Vec::new());
        };

        let len = entry.value.len() as i64;
        let start = if from < 0 { (len + from).max(0) } else { from.min(len) };
        let end = if to < 0 { len + to } else { to.min(len - 1) };
        if start > end || len == 0 {
            return Ok(Vec::new());
        }
        Ok(entry.value[start as usize..=(end as usize)].to_vec())
    }

    async fn list_len(&self, key: &str) -> Result<u64, StoreError> {
        let lists = self.lists.read().expect("lists lock poisoned");
        Ok(lists
            .get(key)
            .filter(|e| e.live())
            .map(|e| e.value.len() as u64)
            .unwrap_or(0))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut kv = self.kv.write().expect("kv lock poisoned");
        kv.insert(
            key.to_string(),
            Expiring {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let kv = self.kv.read().expect("kv lock poisoned");
        Ok(kv
            .get(key)
            .filter(|e| e.live())
            .map(|e| e.value.clone()))
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let mut kv = self.kv.write().expect("kv lock poisoned");
        let current = kv
            .get(key)
            .filter(|e| e.live())
            .map(|e| e.value.parse::<i64>())
            .transpose()
            .map_err(|e| StoreError::Internal(format!("non-numeric counter {}: {}", key, e)))?
            .unwrap_or(0);

        let next = current + 1;
        kv.insert(
            key.to_string(),
            Expiring {
                value: next.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = Instant::now() + ttl;
        {
            let mut lists = self.lists.write().expect("lists lock poisoned");
            if let Some(entry) = lists.get_mut(key).filter(|e| e.live()) {
                entry.expires_at = Some(deadline);
            }
        }
        let mut kv = self.kv.write().expect("kv lock poisoned");
        if let Some(entry) = kv.get_mut(key).filter(|e| e.live()) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lists.write().expect("lists lock poisoned").remove(key);
        self.kv.write().expect("kv lock poisoned").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_current_subscriber() {
        let store = MemoryStore::new();

        let mut a = store.subscribe("flight:q1").await.unwrap();
        let mut b = store.subscribe("flight:q1").await.unwrap();
        store.publish("flight:q1", "one").await.unwrap();

        assert_eq!(a.recv().await.as_deref(), Some("one"));
        assert_eq!(b.recv().await.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_lost() {
        let store = MemoryStore::new();
        store.publish("flight:q2", "early").await.unwrap();

        let mut sub = store.subscribe("flight:q2").await.unwrap();
        store.publish("flight:q2", "late").await.unwrap();
        assert_eq!(sub.recv().await.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_receiving() {
        let store = MemoryStore::new();
        let sub = store.subscribe("flight:q3").await.unwrap();
        drop(sub);
        // Publishing after the drop must not error.
        store.publish("flight:q3", "x").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_indexing_is_gap_free() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .append_to_list("flight_results:q", &format!("e{}", i))
                .await
                .unwrap();
        }

        assert_eq!(store.list_len("flight_results:q").await.unwrap(), 5);
        let all = store.list_range("flight_results:q", 0, -1).await.unwrap();
        assert_eq!(all, vec!["e0", "e1", "e2", "e3", "e4"]);
        let tail = store.list_range("flight_results:q", 3, -1).await.unwrap();
        assert_eq!(tail, vec!["e3", "e4"]);
        let empty = store.list_range("missing", 0, -1).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_counter_increments_and_expires() {
        let store = MemoryStore::new();
        let ttl = Duration::from_millis(30);

        assert_eq!(store.incr_with_expiry("flight_count:q", ttl).await.unwrap(), 1);
        assert_eq!(store.incr_with_expiry("flight_count:q", ttl).await.unwrap(), 2);
        assert_eq!(store.get("flight_count:q").await.unwrap().as_deref(), Some("2"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get("flight_count:q").await.unwrap(), None);
        assert_eq!(store.incr_with_expiry("flight_count:q", ttl).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_clears_both_shapes() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set_with_expiry("k", "v", ttl).await.unwrap();
        store.append_to_list("k", "entry").await.unwrap();

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.list_len("k").await.unwrap(), 0);
    }
}
