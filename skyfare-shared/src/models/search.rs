use serde::{Deserialize, Serialize};

/// A submitted flight search. Immutable once accepted by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub trip_type: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub pax: u32,
}

impl SearchRequest {
    pub fn return_date_or_empty(&self) -> &str {
        self.return_date.as_deref().unwrap_or("")
    }
}
