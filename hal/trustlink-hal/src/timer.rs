//! RTOS one-shot timer facility
//!
//! Models the create/start/stop/delete life cycle of a software timer.
//! The facility knows nothing about the callback the platform layer
//! registers: on expiry the platform calls back into the event timer
//! through a small wrapper that drops the timer handle.

/// Software timer facility
pub trait TimerService {
    /// Handle to a created timer
    type Handle: Copy;

    /// Error returned by timer commands
    type Error;

    /// Ticks per second of the facility
    fn tick_rate_hz(&self) -> u32;

    /// Create a one-shot timer with an initial period
    fn create(&mut self, name: &'static str, period_ticks: u32) -> Result<Self::Handle, Self::Error>;

    /// (Re-)start the timer so it expires `period_ticks` from now
    fn start(&mut self, handle: Self::Handle, period_ticks: u32) -> Result<(), Self::Error>;

    /// Stop the timer without deleting it
    fn stop(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;

    /// Delete the timer; the handle is invalid afterwards
    fn delete(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;
}
