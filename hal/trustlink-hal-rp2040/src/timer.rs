//! One-shot timer service on Embassy
//!
//! The event layer expects an RTOS-style timer facility that calls back
//! on expiry. On Embassy that is a task awaiting [`run_oneshot_timer`];
//! [`EmbassyTimerService`] steers it through a [`Signal`]. A newer
//! command always replaces an older one, which is exactly the re-arm
//! behavior the event needs.
//!
//! ```ignore
//! static COMMANDS: TimerCommands = Signal::new();
//! static EVENT: SystemEvent<u32> = SharedEvent::new(OneShotEvent::new(
//!     EmbassyTimerService::new(&COMMANDS),
//!     EventConfig::DEFAULT,
//! ));
//!
//! #[embassy_executor::task]
//! async fn event_timer_task() {
//!     run_oneshot_timer(&COMMANDS, || EVENT.fire()).await
//! }
//! ```

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer, TICK_HZ};
use trustlink_core::SharedEvent;
use trustlink_hal::TimerService;

/// Command from the timer service to the timer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// (Re)start, expiring after the duration
    Start(Duration),
    /// Cancel a pending expiry
    Stop,
}

/// Command channel between [`EmbassyTimerService`] and the timer task
pub type TimerCommands = Signal<CriticalSectionRawMutex, TimerCommand>;

/// The system-wide one-shot event on Embassy
pub type SystemEvent<A> = SharedEvent<CriticalSectionRawMutex, EmbassyTimerService, A>;

/// Timer service failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerFault {
    /// The single timer already exists
    AlreadyCreated,
    /// The timer was deleted or never created
    NotCreated,
}

/// [`TimerService`] with a single timer, served by [`run_oneshot_timer`]
pub struct EmbassyTimerService {
    commands: &'static TimerCommands,
    created: bool,
}

impl EmbassyTimerService {
    pub const fn new(commands: &'static TimerCommands) -> Self {
        Self {
            commands,
            created: false,
        }
    }

    fn check(&self) -> Result<(), TimerFault> {
        if self.created {
            Ok(())
        } else {
            Err(TimerFault::NotCreated)
        }
    }
}

impl TimerService for EmbassyTimerService {
    type Handle = ();
    type Error = TimerFault;

    fn tick_rate_hz(&self) -> u32 {
        TICK_HZ as u32
    }

    fn create(&mut self, _name: &'static str, _period_ticks: u32) -> Result<(), TimerFault> {
        if self.created {
            return Err(TimerFault::AlreadyCreated);
        }
        self.created = true;
        Ok(())
    }

    fn start(&mut self, _handle: (), period_ticks: u32) -> Result<(), TimerFault> {
        self.check()?;
        self.commands
            .signal(TimerCommand::Start(Duration::from_ticks(period_ticks as u64)));
        Ok(())
    }

    fn stop(&mut self, _handle: ()) -> Result<(), TimerFault> {
        self.check()?;
        self.commands.signal(TimerCommand::Stop);
        Ok(())
    }

    fn delete(&mut self, handle: ()) -> Result<(), TimerFault> {
        self.stop(handle)?;
        self.created = false;
        Ok(())
    }
}

/// Timer task body: wait for commands and call `on_expiry` when a started
/// timer runs out without being restarted or stopped
pub async fn run_oneshot_timer(commands: &TimerCommands, mut on_expiry: impl FnMut()) -> ! {
    loop {
        let mut command = commands.wait().await;
        while let TimerCommand::Start(after) = command {
            match select(Timer::after(after), commands.wait()).await {
                Either::First(()) => {
                    on_expiry();
                    break;
                }
                Either::Second(next) => command = next,
            }
        }
    }
}
