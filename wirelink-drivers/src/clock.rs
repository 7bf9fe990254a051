//! Clock backed by the embassy time driver

use embassy_time::Instant;
use wirelink_hal::Clock;

/// Millisecond clock reading the embassy time driver
///
/// The 64-bit uptime is truncated to 32 bits; the transfer engine only
/// compares instants with wrapping arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
