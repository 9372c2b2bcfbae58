//! The durable keyed-store-and-broker boundary.
//!
//! The pipeline only talks to this trait: an ephemeral publish/subscribe
//! channel for live fan-out plus TTL'd keys and indexed lists for the
//! durable replay log. Production runs on Redis; tests run on the
//! in-process store.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Store error: {0}")]
    Internal(String),
}

/// A live subscription to one channel.
///
/// Dropping the handle tears down the delivery task, so every subscribe is
/// paired with exactly one unsubscribe no matter how the consumer exits.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<String>,
    forward: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<String>, forward: JoinHandle<()>) -> Self {
        Self { rx, forward }
    }

    /// Next payload, or `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.forward.abort();
    }
}

#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Deliver `payload` to every listener currently subscribed to
    /// `channel`. No buffering: late subscribers miss earlier messages.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), StoreError>;

    /// Subscribe to `channel`. The subscription is live once this returns.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError>;

    /// Append to the indexed list at `key`. Index assignment is owned by
    /// the store; entries land at the current list length, gap-free.
    async fn append_to_list(&self, key: &str, payload: &str) -> Result<(), StoreError>;

    /// Read list entries from `from` to `to` inclusive; `-1` means the last
    /// entry. Missing keys read as empty.
    async fn list_range(&self, key: &str, from: i64, to: i64) -> Result<Vec<String>, StoreError>;

    async fn list_len(&self, key: &str) -> Result<u64, StoreError>;

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomic increment that also refreshes the key's TTL. Returns the new
    /// value.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;

    /// Refresh the TTL on an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
