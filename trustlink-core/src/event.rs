//! One-shot event timer
//!
//! A single callback slot backed by a single RTOS timer. The timer is
//! created lazily on the first registration and re-armed by every later
//! one; it is only deleted by [`OneShotEvent::destroy`].
//!
//! State machine:
//!
//! ```text
//!  Idle ──register──▶ Armed ──expiry──▶ Fired ──callback returns──▶ Idle
//!                       ▲ │                │
//!                       └─┘ re-arm         └──register from callback──▶ Armed
//! ```
//!
//! One instance serves the whole system because the bus arbiter allows
//! only one secure-element operation in flight. It is not meant to be
//! registered from two callers at once.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use trustlink_hal::TimerService;

use crate::config::EventConfig;

/// Callback run on expiry with the argument stored at registration
pub type EventCallback<A> = fn(A);

/// Lifecycle of the event slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventState {
    /// Nothing scheduled
    Idle,
    /// Timer running, callback pending
    Armed,
    /// Expired, callback being dispatched
    Fired,
}

/// What a registration did to the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arming {
    /// Slot was not armed
    Armed,
    /// An earlier callback had not fired yet and was replaced
    Replaced,
}

/// Timer facility failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventError {
    /// Creating or starting the RTOS timer failed
    Timer,
}

/// A callback copied out of the slot, ready to run
#[derive(Debug, Clone, Copy)]
pub struct Dispatch<A> {
    callback: EventCallback<A>,
    arg: A,
}

impl<A> Dispatch<A> {
    /// Invoke the callback
    pub fn run(self) {
        (self.callback)(self.arg)
    }
}

/// Convert a delay in µs to timer ticks, never less than one tick
pub fn ticks_from_us(delay_us: u32, tick_rate_hz: u32) -> u32 {
    let ticks = (delay_us as u64 * tick_rate_hz as u64) / 1_000_000;
    ticks.clamp(1, u32::MAX as u64) as u32
}

/// One-shot event timer
pub struct OneShotEvent<T: TimerService, A> {
    timer: T,
    handle: Option<T::Handle>,
    slot: Option<Dispatch<A>>,
    triggered: bool,
    state: EventState,
    config: EventConfig,
    instances_created: u32,
}

impl<T: TimerService, A: Copy> OneShotEvent<T, A> {
    /// Create the event; no RTOS timer exists until the first registration
    pub const fn new(timer: T, config: EventConfig) -> Self {
        Self {
            timer,
            handle: None,
            slot: None,
            triggered: false,
            state: EventState::Idle,
            config,
            instances_created: 0,
        }
    }

    /// Return the event, starting it when a callback is given
    pub fn create(
        &mut self,
        callback: Option<EventCallback<A>>,
        arg: A,
    ) -> Result<&mut Self, EventError> {
        if let Some(callback) = callback {
            self.start(callback, arg)?;
        }
        Ok(self)
    }

    /// Arm the default delay unless a wait is already in flight
    ///
    /// Returns `None` when a wait was already in flight and nothing was
    /// armed. A failed arming leaves the event untriggered.
    pub fn start(
        &mut self,
        callback: EventCallback<A>,
        arg: A,
    ) -> Result<Option<Arming>, EventError> {
        if self.triggered {
            return Ok(None);
        }
        let delay_us = self.config.default_delay_us;
        let arming = self.register_oneshot(callback, arg, delay_us)?;
        self.triggered = true;
        Ok(Some(arming))
    }

    /// Clear the triggered flag
    ///
    /// The timer keeps running and the registered callback stays in place.
    pub fn stop(&mut self) {
        self.triggered = false;
    }

    /// Register `callback` to run once after `delay_us`
    ///
    /// Creates the timer on first use, then (re-)starts it with the new
    /// delay. Registering while a previous callback is still pending
    /// replaces it; that is reported as [`Arming::Replaced`]. On error the
    /// slot keeps whatever callback was registered before.
    pub fn register_oneshot(
        &mut self,
        callback: EventCallback<A>,
        arg: A,
        delay_us: u32,
    ) -> Result<Arming, EventError> {
        let arming = if self.state == EventState::Armed {
            warn!("one-shot event re-armed before the pending callback fired");
            Arming::Replaced
        } else {
            Arming::Armed
        };

        let ticks = ticks_from_us(delay_us, self.timer.tick_rate_hz());
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = self
                    .timer
                    .create(self.config.timer_name, ticks)
                    .map_err(|_| {
                        error!("one-shot timer creation failed");
                        EventError::Timer
                    })?;
                self.handle = Some(handle);
                self.instances_created += 1;
                handle
            }
        };

        self.timer.start(handle, ticks).map_err(|_| {
            error!("one-shot timer start failed");
            EventError::Timer
        })?;

        trace!("one-shot event armed for {} ticks", ticks);
        self.slot = Some(Dispatch { callback, arg });
        self.state = EventState::Armed;
        Ok(arming)
    }

    /// Mark the slot fired and copy the registered callback out
    ///
    /// For expiry contexts that hold the event behind a lock: run the
    /// returned [`Dispatch`] after the lock is dropped, then call
    /// [`settle`](Self::settle).
    pub fn expire(&mut self) -> Option<Dispatch<A>> {
        match self.slot {
            Some(dispatch) => {
                self.state = EventState::Fired;
                Some(dispatch)
            }
            None => {
                self.state = EventState::Idle;
                None
            }
        }
    }

    /// Finish a dispatch started by [`expire`](Self::expire)
    ///
    /// Leaves the slot armed if the callback registered a new wait.
    pub fn settle(&mut self) {
        if self.state == EventState::Fired {
            self.state = EventState::Idle;
        }
    }

    /// Run the registered callback, if any, with its stored argument
    pub fn trigger_registered_callback(&mut self) {
        if let Some(dispatch) = self.expire() {
            dispatch.run();
        }
        self.settle();
    }

    /// Expiry entry point for the timer facility
    ///
    /// The handle is not needed: there is only one timer.
    pub fn on_timer_expired(&mut self, _handle: T::Handle) {
        self.trigger_registered_callback();
    }

    /// Stop and delete the timer
    ///
    /// On success the next registration creates a fresh timer. Failures
    /// are logged and leave the timer handle in place.
    pub fn destroy(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };

        let stopped = self.timer.stop(handle).is_ok();
        let deleted = self.timer.delete(handle).is_ok();

        if stopped && deleted {
            self.handle = None;
            self.state = EventState::Idle;
        } else {
            error!(
                "event destroy failed: stop ok={}, delete ok={}",
                stopped,
                deleted
            );
        }
    }

    /// Current state of the slot
    pub fn state(&self) -> EventState {
        self.state
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Whether the RTOS timer currently exists
    pub fn timer_exists(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of RTOS timers created over the lifetime of this event
    pub fn instances_created(&self) -> u32 {
        self.instances_created
    }

    /// Borrow the timer facility
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutably borrow the timer facility
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

/// [`OneShotEvent`] shared between the registering side and the timer
/// expiry context
///
/// The callback runs with the lock released, so it may register the next
/// wait on the same event.
pub struct SharedEvent<M: RawMutex, T: TimerService, A> {
    inner: Mutex<M, RefCell<OneShotEvent<T, A>>>,
}

impl<M: RawMutex, T: TimerService, A: Copy> SharedEvent<M, T, A> {
    pub const fn new(event: OneShotEvent<T, A>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(event)),
        }
    }

    /// Run `f` on the event under the lock
    ///
    /// `f` must not re-enter this `SharedEvent`.
    pub fn with<R>(&self, f: impl FnOnce(&mut OneShotEvent<T, A>) -> R) -> R {
        self.inner.lock(|event| f(&mut event.borrow_mut()))
    }

    /// See [`OneShotEvent::register_oneshot`]
    pub fn register_oneshot(
        &self,
        callback: EventCallback<A>,
        arg: A,
        delay_us: u32,
    ) -> Result<Arming, EventError> {
        self.with(|event| event.register_oneshot(callback, arg, delay_us))
    }

    /// Timer expiry: dispatch the registered callback outside the lock
    pub fn fire(&self) {
        if let Some(dispatch) = self.with(|event| event.expire()) {
            dispatch.run();
        }
        self.with(|event| event.settle());
    }

    pub fn state(&self) -> EventState {
        self.with(|event| event.state())
    }

    /// See [`OneShotEvent::destroy`]
    pub fn destroy(&self) {
        self.with(|event| event.destroy());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Timer facility with 1 ms ticks that records commands
    #[derive(Default)]
    struct MockTimer {
        created: u32,
        starts: u32,
        last_period: u32,
        running: bool,
        alive: bool,
        fail_create_once: bool,
        fail_start: bool,
        fail_stop: bool,
        fail_delete: bool,
    }

    impl TimerService for MockTimer {
        type Handle = u8;
        type Error = ();

        fn tick_rate_hz(&self) -> u32 {
            1000
        }

        fn create(&mut self, _name: &'static str, period_ticks: u32) -> Result<u8, ()> {
            if self.fail_create_once {
                self.fail_create_once = false;
                return Err(());
            }
            self.created += 1;
            self.alive = true;
            self.last_period = period_ticks;
            Ok(self.created as u8)
        }

        fn start(&mut self, _handle: u8, period_ticks: u32) -> Result<(), ()> {
            if !self.alive || self.fail_start {
                return Err(());
            }
            self.starts += 1;
            self.last_period = period_ticks;
            self.running = true;
            Ok(())
        }

        fn stop(&mut self, _handle: u8) -> Result<(), ()> {
            if self.fail_stop {
                return Err(());
            }
            self.running = false;
            Ok(())
        }

        fn delete(&mut self, _handle: u8) -> Result<(), ()> {
            if self.fail_delete {
                return Err(());
            }
            self.alive = false;
            Ok(())
        }
    }

    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }

    fn bump_twice(counter: &Cell<u32>) {
        counter.set(counter.get() + 2);
    }

    fn event<'a>() -> OneShotEvent<MockTimer, &'a Cell<u32>> {
        OneShotEvent::new(MockTimer::default(), EventConfig::default())
    }

    #[test]
    fn test_timer_created_lazily() {
        let fired = Cell::new(0);
        let mut ev = event();
        assert!(!ev.timer_exists());

        ev.register_oneshot(bump, &fired, 5000).unwrap();
        assert!(ev.timer_exists());
        assert_eq!(ev.timer().created, 1);
        assert_eq!(ev.timer().last_period, 5);
        assert_eq!(ev.state(), EventState::Armed);
    }

    #[test]
    fn test_second_registration_rearms_single_timer() {
        let fired = Cell::new(0);
        let mut ev = event();

        assert_eq!(ev.register_oneshot(bump, &fired, 1000), Ok(Arming::Armed));
        assert_eq!(
            ev.register_oneshot(bump_twice, &fired, 3000),
            Ok(Arming::Replaced)
        );

        assert_eq!(ev.instances_created(), 1);
        assert_eq!(ev.timer().created, 1);
        assert_eq!(ev.timer().starts, 2);
        assert_eq!(ev.timer().last_period, 3);

        // Only the replacement runs
        ev.trigger_registered_callback();
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_sub_tick_delay_rounds_up() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 50).unwrap();
        assert_eq!(ev.timer().last_period, 1);

        ev.register_oneshot(bump, &fired, 0).unwrap();
        assert_eq!(ev.timer().last_period, 1);
    }

    #[test]
    fn test_tick_conversion() {
        assert_eq!(ticks_from_us(50, 1000), 1);
        assert_eq!(ticks_from_us(1000, 1000), 1);
        assert_eq!(ticks_from_us(2500, 1000), 2);
        assert_eq!(ticks_from_us(1000, 32_768), 32);
        assert_eq!(ticks_from_us(u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_trigger_runs_callback_and_returns_to_idle() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.on_timer_expired(1);

        assert_eq!(fired.get(), 1);
        assert_eq!(ev.state(), EventState::Idle);

        // Registration after firing is a fresh arming, not a replacement
        assert_eq!(ev.register_oneshot(bump, &fired, 1000), Ok(Arming::Armed));
    }

    #[test]
    fn test_trigger_without_registration_is_noop() {
        let mut ev = event();
        ev.trigger_registered_callback();
        assert_eq!(ev.state(), EventState::Idle);
    }

    #[test]
    fn test_start_is_not_reentrant() {
        let fired = Cell::new(0);
        let mut ev = event();

        assert_eq!(ev.start(bump, &fired), Ok(Some(Arming::Armed)));
        assert_eq!(ev.start(bump, &fired), Ok(None));
        assert!(ev.is_triggered());
        assert_eq!(ev.timer().starts, 1);
        assert_eq!(ev.timer().last_period, 1);

        ev.stop();
        assert!(!ev.is_triggered());
        ev.start(bump, &fired).unwrap();
        assert_eq!(ev.timer().starts, 2);
    }

    #[test]
    fn test_stop_keeps_callback() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.start(bump, &fired).unwrap();
        ev.stop();
        ev.trigger_registered_callback();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_destroy_then_register_recreates_once() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.destroy();
        assert!(!ev.timer_exists());
        assert_eq!(ev.state(), EventState::Idle);

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.register_oneshot(bump, &fired, 1000).unwrap();
        assert_eq!(ev.instances_created(), 2);
        assert_eq!(ev.timer().created, 2);
    }

    #[test]
    fn test_destroy_failure_keeps_handle() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.timer_mut().fail_delete = true;
        ev.destroy();

        assert!(ev.timer_exists());
        // Stop was still attempted
        assert!(!ev.timer().running);
    }

    #[test]
    fn test_destroy_without_timer_is_noop() {
        let mut ev = event();
        ev.destroy();
        assert!(!ev.timer_exists());
    }

    #[test]
    fn test_create_starts_when_callback_given() {
        let fired = Cell::new(0);
        let mut ev = event();

        assert!(!ev.create(None, &fired).unwrap().is_triggered());
        assert!(ev.create(Some(bump), &fired).unwrap().is_triggered());
    }

    #[test]
    fn test_expire_then_settle_allows_rearm_from_callback() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        let dispatch = ev.expire().unwrap();
        assert_eq!(ev.state(), EventState::Fired);

        dispatch.run();
        // What a callback chaining the next wait would do
        assert_eq!(ev.register_oneshot(bump, &fired, 1000), Ok(Arming::Armed));
        ev.settle();
        assert_eq!(ev.state(), EventState::Armed);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_shared_event_fires_outside_lock() {
        use embassy_sync::blocking_mutex::raw::NoopRawMutex;

        let fired = Cell::new(0);
        let shared: SharedEvent<NoopRawMutex, _, _> = SharedEvent::new(event());

        shared.register_oneshot(bump, &fired, 2000).unwrap();
        assert_eq!(shared.state(), EventState::Armed);

        shared.fire();
        assert_eq!(fired.get(), 1);
        assert_eq!(shared.state(), EventState::Idle);

        shared.destroy();
        assert!(!shared.with(|ev| ev.timer_exists()));
    }

    #[test]
    fn test_start_retries_after_failed_create() {
        let fired = Cell::new(0);
        let mut ev = event();
        ev.timer_mut().fail_create_once = true;

        assert_eq!(ev.start(bump, &fired), Err(EventError::Timer));
        assert!(!ev.is_triggered());
        assert!(!ev.timer_exists());
        assert_eq!(ev.state(), EventState::Idle);

        // Facility recovered: the next start really arms
        assert_eq!(ev.start(bump, &fired), Ok(Some(Arming::Armed)));
        assert!(ev.is_triggered());
        assert!(ev.timer_exists());
        assert_eq!(ev.timer().created, 1);
        assert_eq!(ev.state(), EventState::Armed);
    }

    #[test]
    fn test_failed_rearm_keeps_pending_callback() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.timer_mut().fail_start = true;
        assert_eq!(
            ev.register_oneshot(bump_twice, &fired, 1000),
            Err(EventError::Timer)
        );
        assert_eq!(ev.state(), EventState::Armed);

        ev.trigger_registered_callback();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_start_reports_replaced_callback() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 5000).unwrap();
        assert_eq!(ev.start(bump_twice, &fired), Ok(Some(Arming::Replaced)));
    }

    #[test]
    fn test_destroy_stop_failure_keeps_handle() {
        let fired = Cell::new(0);
        let mut ev = event();

        ev.register_oneshot(bump, &fired, 1000).unwrap();
        ev.timer_mut().fail_stop = true;
        ev.destroy();

        assert!(ev.timer_exists());
        assert_eq!(ev.state(), EventState::Armed);
        // Delete was still attempted
        assert!(!ev.timer().alive);
    }
}
