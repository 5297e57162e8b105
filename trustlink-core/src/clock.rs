//! Monotonic clock
//!
//! Millisecond uptime on top of a [`TickSource`], with a stopwatch for
//! performance measurement and a tick-driven delay for platforms that
//! have no hardware delay.
//!
//! Microsecond values are the millisecond count times 1000; they carry no
//! sub-millisecond precision.

use embedded_hal::delay::DelayNs;
use trustlink_hal::TickSource;

/// Millisecond uptime clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock<T> {
    source: T,
}

impl<T: TickSource> MonotonicClock<T> {
    /// Wrap a tick source
    pub const fn new(source: T) -> Self {
        Self { source }
    }

    /// Milliseconds since boot
    pub fn now_ms(&self) -> u32 {
        self.source.now_ms()
    }

    /// Microseconds since boot, in steps of 1000
    pub fn now_us(&self) -> u32 {
        self.now_ms().wrapping_mul(1000)
    }

    /// Milliseconds since `since_ms`, correct across counter wrap
    pub fn elapsed_ms(&self, since_ms: u32) -> u32 {
        self.now_ms().wrapping_sub(since_ms)
    }

    /// Check whether `duration_ms` has passed since `since_ms`
    pub fn has_elapsed(&self, since_ms: u32, duration_ms: u32) -> bool {
        self.elapsed_ms(since_ms) >= duration_ms
    }

    /// Start a stopwatch now
    pub fn stopwatch(&self) -> Stopwatch {
        Stopwatch {
            start_ms: self.now_ms(),
        }
    }
}

/// Start/stop pair around an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stopwatch {
    start_ms: u32,
}

impl Stopwatch {
    /// Start time (ms)
    pub fn start_ms(&self) -> u32 {
        self.start_ms
    }

    /// Milliseconds since start
    pub fn elapsed_ms<T: TickSource>(&self, clock: &MonotonicClock<T>) -> u32 {
        clock.elapsed_ms(self.start_ms)
    }

    /// Return the elapsed time and start over
    pub fn lap<T: TickSource>(&mut self, clock: &MonotonicClock<T>) -> u32 {
        let now = clock.now_ms();
        let elapsed = now.wrapping_sub(self.start_ms);
        self.start_ms = now;
        elapsed
    }
}

/// Busy-wait delay driven by the tick counter
///
/// Requests are rounded up to whole milliseconds and always wait at least
/// the requested time.
pub struct TickDelay<T> {
    source: T,
}

impl<T: TickSource> TickDelay<T> {
    pub const fn new(source: T) -> Self {
        Self { source }
    }

    fn wait_ms(&self, ms: u32) {
        if ms == 0 {
            return;
        }
        let start = self.source.now_ms();
        // A partial first tick does not count
        while self.source.now_ms().wrapping_sub(start) <= ms {
            core::hint::spin_loop();
        }
    }
}

impl<T: TickSource> DelayNs for TickDelay<T> {
    fn delay_ns(&mut self, ns: u32) {
        self.wait_ms(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait_ms(us.div_ceil(1000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Tick source that advances by `step` on every read
    struct SteppingTicks {
        now: Cell<u32>,
        step: u32,
    }

    impl SteppingTicks {
        fn new(start: u32, step: u32) -> Self {
            Self {
                now: Cell::new(start),
                step,
            }
        }
    }

    impl TickSource for SteppingTicks {
        fn now_ms(&self) -> u32 {
            let now = self.now.get();
            self.now.set(now.wrapping_add(self.step));
            now
        }
    }

    #[test]
    fn test_microseconds_derived_from_milliseconds() {
        let clock = MonotonicClock::new(SteppingTicks::new(42, 0));
        assert_eq!(clock.now_ms(), 42);
        assert_eq!(clock.now_us(), 42_000);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let clock = MonotonicClock::new(SteppingTicks::new(5, 0));
        assert_eq!(clock.elapsed_ms(u32::MAX - 4), 10);
        assert!(clock.has_elapsed(u32::MAX - 4, 10));
        assert!(!clock.has_elapsed(u32::MAX - 4, 11));
    }

    #[test]
    fn test_stopwatch() {
        let clock = MonotonicClock::new(SteppingTicks::new(100, 7));
        let mut sw = clock.stopwatch();
        assert_eq!(sw.start_ms(), 100);
        assert_eq!(sw.elapsed_ms(&clock), 7);
        assert_eq!(sw.lap(&clock), 14);
        assert_eq!(sw.start_ms(), 114);
    }

    #[test]
    fn test_tick_delay_waits_at_least_requested() {
        let ticks = SteppingTicks::new(0, 1);
        let mut delay = TickDelay::new(&ticks);

        delay.delay_ms(3);
        // start read at 0, loop exits once a read returns 4
        assert!(ticks.now.get() >= 4);
    }

    #[test]
    fn test_tick_delay_rounds_up_sub_millisecond() {
        let ticks = SteppingTicks::new(0, 1);
        let mut delay = TickDelay::new(&ticks);

        delay.delay_us(100);
        assert!(ticks.now.get() >= 2);
    }

    #[test]
    fn test_tick_delay_zero_returns_immediately() {
        let ticks = SteppingTicks::new(0, 1);
        let mut delay = TickDelay::new(&ticks);

        delay.delay_ns(0);
        assert_eq!(ticks.now.get(), 0);
    }
}
