//! Millisecond timestamps for persisted records.

use tokio::time::Instant;

/// Wall-clock milliseconds derived from a monotonic anchor.
///
/// The epoch offset is read once from the system clock; later readings add
/// the monotonic time elapsed since then. Timestamps therefore never jump
/// backwards, and under a paused tokio clock they follow virtual time.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    epoch_ms: i64,
    anchor: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self::starting_at(chrono::Utc::now().timestamp_millis())
    }

    /// A clock whose first reading is `epoch_ms`.
    pub fn starting_at(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            anchor: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}
