//! Session id generation

use std::sync::atomic::{AtomicU64, Ordering};

use lemonade_core::SessionId;

/// Issues process-unique session ids from the wall clock in milliseconds.
///
/// Two ids requested within the same millisecond (or after the clock stepped
/// backwards) are bumped to one past the last issued id, so ids are strictly
/// increasing for the lifetime of the generator.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    last: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> SessionId {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_at(now)
    }

    /// Next id given the current time in milliseconds
    pub fn next_at(&self, now_ms: u64) -> SessionId {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        SessionId(now_ms.max(previous + 1))
    }

    /// Last issued id, if any
    pub fn last(&self) -> Option<SessionId> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            id => Some(SessionId(id)),
        }
    }
}
