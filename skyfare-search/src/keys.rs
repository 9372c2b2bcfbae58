//! Channel and key naming for one search run.

/// Pub/sub channel carrying live result events.
pub fn result_channel(query_id: &str) -> String {
    format!("flight:{}", query_id)
}

/// Durable replay log of everything published on the channel.
pub fn results_key(query_id: &str) -> String {
    format!("flight_results:{}", query_id)
}

/// Durable count of mirrored events, read by the poll transport.
pub fn count_key(query_id: &str) -> String {
    format!("flight_count:{}", query_id)
}

/// Scratch copy of one produced event, cleared on cancellation.
pub fn scratch_key(query_id: &str, source: &str, seq: u32) -> String {
    format!("search_result:{}:{}:{}", query_id, source, seq)
}
