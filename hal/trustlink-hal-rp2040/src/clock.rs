//! Embassy uptime as a tick source

use embassy_time::Instant;
use trustlink_hal::TickSource;

/// Milliseconds since boot from the Embassy time driver
///
/// Truncated to 32 bits; wraps after about 49 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTicks;

impl TickSource for EmbassyTicks {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
