//! Monotonic clock backed by the embassy time driver

use embassy_time::Instant;
use fbio_hal::Monotonic;

/// Milliseconds since boot
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Monotonic for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
