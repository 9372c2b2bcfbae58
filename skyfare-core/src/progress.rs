//! Progress computation shared by every result transport.
//!
//! All three transports (WebSocket, SSE, long poll) render the same frames;
//! only the delivery mechanics differ. The percentage is always computed
//! against the protocol-level expected total advertised to clients, which is
//! a fixed constant distinct from the orchestrator's internal per-run
//! expected count.

use skyfare_shared::{FlightResult, FrameKind, ProgressFrame, ResultEvent, SearchStatus};

/// Expected total advertised to clients: 8-10 flights per source, average ~8.
pub const EXPECTED_PROTOCOL_FLIGHTS: u64 = 24;

pub const MSG_STARTING: &str = "Starting flight search...";
pub const MSG_COMPLETED: &str = "All flights found";
pub const MSG_CANCELLED: &str = "Search was cancelled";
pub const MSG_POLL_TIMEOUT: &str = "Search still in progress. Please continue polling.";
pub const MSG_STREAM_TIMEOUT: &str = "Search timeout - please try again";

/// Completion percentage, clamped to 0-100.
pub fn percent(received: u64, expected: u64) -> u8 {
    if expected == 0 {
        return 0;
    }
    (received * 100 / expected).min(100) as u8
}

/// The `searching, 0%` frame sent as soon as a push transport connects.
pub fn initial_frame() -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Progress,
        status: SearchStatus::Searching,
        progress: 0,
        received_flights: None,
        total_expected: None,
        message: Some(MSG_STARTING.to_string()),
        flight: None,
        total_flights: None,
        last_seen_index: None,
    }
}

pub fn result_frame(flight: FlightResult, received: u64, expected: u64) -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Result,
        status: if received >= expected {
            SearchStatus::Completed
        } else {
            SearchStatus::Searching
        },
        progress: percent(received, expected),
        received_flights: Some(received),
        total_expected: Some(expected),
        message: None,
        flight: Some(flight),
        total_flights: None,
        last_seen_index: None,
    }
}

pub fn completed_frame(total_flights: u64) -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Completed,
        status: SearchStatus::Completed,
        progress: 100,
        received_flights: None,
        total_expected: None,
        message: Some(MSG_COMPLETED.to_string()),
        flight: None,
        total_flights: Some(total_flights),
        last_seen_index: None,
    }
}

pub fn cancelled_frame() -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Cancelled,
        status: SearchStatus::Cancelled,
        progress: 0,
        received_flights: None,
        total_expected: None,
        message: Some(MSG_CANCELLED.to_string()),
        flight: None,
        total_flights: None,
        last_seen_index: None,
    }
}

/// Frame returned by the poll transport when its wait ceiling elapses.
/// Carries the caller's cursor unchanged so a retry neither loses nor
/// double-counts events.
pub fn poll_timeout_frame(received: u64, expected: u64, last_seen_index: u64) -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Timeout,
        status: SearchStatus::Timeout,
        progress: percent(received, expected),
        received_flights: Some(received),
        total_expected: Some(expected),
        message: Some(MSG_POLL_TIMEOUT.to_string()),
        flight: None,
        total_flights: None,
        last_seen_index: Some(last_seen_index),
    }
}

/// Frame sent by a push transport when its connection lifetime ceiling
/// elapses. The underlying search keeps running.
pub fn stream_timeout_frame(received: u64, expected: u64) -> ProgressFrame {
    ProgressFrame {
        kind: FrameKind::Timeout,
        status: SearchStatus::Timeout,
        progress: percent(received, expected),
        received_flights: Some(received),
        total_expected: Some(expected),
        message: Some(MSG_STREAM_TIMEOUT.to_string()),
        flight: None,
        total_flights: None,
        last_seen_index: None,
    }
}

/// The single progress state machine replicated by both push transports.
///
/// Counts result events and renders each one as a frame. Completion and
/// cancellation are driven solely by the terminal events published on the
/// result channel, never inferred locally from the advertised total.
#[derive(Debug)]
pub struct StreamTracker {
    received: u64,
    expected: u64,
}

impl StreamTracker {
    pub fn new(expected: u64) -> Self {
        Self {
            received: 0,
            expected,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn observe(&mut self, event: &ResultEvent) -> ProgressFrame {
        match event {
            ResultEvent::Result(flight) => {
                self.received += 1;
                let mut frame = result_frame(flight.clone(), self.received, self.expected);
                // Live transports stay in `searching` until the orchestrator
                // publishes the terminal event; the advertised total only
                // drives the percentage.
                frame.status = SearchStatus::Searching;
                frame
            }
            ResultEvent::Completed { total_flights } => completed_frame(*total_flights),
            ResultEvent::Cancelled => cancelled_frame(),
        }
    }
}
