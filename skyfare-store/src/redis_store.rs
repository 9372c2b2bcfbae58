use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::warn;

use crate::store::{SearchStore, StoreError, Subscription};

/// Redis-backed store and broker. Commands run on a multiplexed connection
/// established per call; subscriptions hold their own pub/sub connection.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_string).map_err(StoreError::Redis)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchStore for RedisStore {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.publish::<_, _, ()>(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        // Subscribe before spawning the forwarder so the subscription is
        // active when this returns; callers order workers after it.
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let channel_name = channel.to_string();
        let forward = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                match msg.get_payload::<String>() {
                    Ok(payload) => {
                        if tx.send(payload).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Dropping undecodable message on {}: {}", channel_name, e);
                    }
                }
            }
        });

        Ok(Subscription::new(rx, forward))
    }

    async fn append_to_list(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.rpush::<_, _, ()>(key, payload).await?;
        Ok(())
    }

    async fn list_range(&self, key: &str, from: i64, to: i64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let entries: Vec<String> = conn.lrange(key, from as isize, to as isize).await?;
        Ok(entries)
    }

    async fn list_len(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.expire::<_, ()>(key, ttl.as_secs() as i64).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
