//! Minimum spacing between outbound requests.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Hands out request slots at least `min_interval` apart.
///
/// Slots are reserved under a short lock and waited for outside it, so
/// concurrent callers queue in reservation order without holding the lock
/// across an await.
#[derive(Debug)]
pub(crate) struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserve the next slot and return when it starts.
    pub(crate) fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut next = self.next_slot.lock();
        let slot = next.map_or(now, |reserved| reserved.max(now));
        *next = Some(slot + self.min_interval);
        slot
    }

    /// Wait until this caller may send its request.
    pub(crate) async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        tokio::time::sleep_until(self.reserve()).await;
    }
}
