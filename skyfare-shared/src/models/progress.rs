use serde::{Deserialize, Serialize};

use super::events::FlightResult;

/// Wire-level frame type, mirrored by all three result transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Result,
    Progress,
    Completed,
    Cancelled,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Searching,
    Completed,
    Cancelled,
    Timeout,
}

impl SearchStatus {
    /// Terminal states end the transport session; `Timeout` is transport-local
    /// and the client is expected to reconnect or re-poll.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStatus::Completed | SearchStatus::Cancelled)
    }
}

/// The rendered, transport-agnostic progress message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub status: SearchStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_flights: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub flight: Option<FlightResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_flights: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_index: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_stay_off_the_wire() {
        let frame = ProgressFrame {
            kind: FrameKind::Progress,
            status: SearchStatus::Searching,
            progress: 0,
            received_flights: None,
            total_expected: None,
            message: Some("Starting flight search...".into()),
            flight: None,
            total_flights: None,
            last_seen_index: None,
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""type":"progress""#));
        assert!(json.contains(r#""status":"searching""#));
        assert!(!json.contains("received_flights"));
        assert!(!json.contains("last_seen_index"));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SearchStatus::Completed.is_terminal());
        assert!(SearchStatus::Cancelled.is_terminal());
        assert!(!SearchStatus::Searching.is_terminal());
        assert!(!SearchStatus::Timeout.is_terminal());
    }
}
