//! Time base abstraction

/// Millisecond uptime counter
///
/// Monotonic for the uptime of the device. Wraps at `u32::MAX`.
pub trait TickSource {
    /// Milliseconds since boot
    fn now_ms(&self) -> u32;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
