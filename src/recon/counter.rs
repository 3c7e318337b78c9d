//! Outbound call accounting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static TOTAL_API_CALLS: AtomicU64 = AtomicU64::new(0);

/// Number of outbound calls issued by every client in this process.
#[must_use]
pub fn total_api_calls() -> u64 {
    TOTAL_API_CALLS.load(Ordering::Relaxed)
}

/// Monotonic count of outbound calls issued through one client.
///
/// Clones share the same count, so a handle taken before a run keeps
/// observing the client it came from.
#[derive(Debug, Clone, Default)]
pub struct ApiCallCounter {
    calls: Arc<AtomicU64>,
}

impl ApiCallCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Records one outbound call.
    pub fn increment(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        TOTAL_API_CALLS.fetch_add(1, Ordering::Relaxed);
    }
}
