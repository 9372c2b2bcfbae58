pub mod bridge;
pub mod completion;
pub mod keys;
pub mod orchestrator;
pub mod poll;
pub mod worker;

pub use orchestrator::SearchOrchestrator;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Store error: {0}")]
    Store(#[from] skyfare_store::StoreError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SearchResult<T> = Result<T, SearchError>;
