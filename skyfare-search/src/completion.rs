use std::sync::atomic::{AtomicU64, Ordering};

/// Shared produced-event counter for one search run.
///
/// Every worker increments it after publishing an event. `fetch_add` hands
/// each caller a unique total, so exactly one of the racing workers sees the
/// expected threshold being crossed and owns publishing the single
/// completion event.
#[derive(Debug)]
pub struct CompletionCounter {
    expected: u64,
    sent: AtomicU64,
}

impl CompletionCounter {
    pub fn new(expected: u64) -> Self {
        Self {
            expected,
            sent: AtomicU64::new(0),
        }
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Record one produced event. Returns the new total and whether this
    /// call crossed the expected threshold.
    pub fn record(&self) -> (u64, bool) {
        let total = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        (total, total == self.expected)
    }
}
