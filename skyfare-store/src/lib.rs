pub mod app_config;
pub mod memory_store;
pub mod redis_store;
pub mod store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{SearchStore, StoreError, Subscription};
