//! Command session glue
//!
//! Bridges the callback-based completion of the command library to a
//! caller that wants to wait for the result. The caller arms the
//! [`Completion`] (status becomes the Busy sentinel), issues the
//! operation and waits; the completion callback stores the final status
//! once.
//!
//! The wait itself enforces no timeout. A timeout is layered on top by
//! arming the one-shot event timer with a callback that calls
//! [`Completion::force_error`], or by waiting with
//! [`Completion::wait_until`], which gives up without touching a transfer
//! that may still be in flight.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU16, Ordering};
use trustlink_hal::TickSource;

use crate::clock::MonotonicClock;
use crate::transport::{CompletionHandler, TransportEvent};

/// Operation finished successfully
pub const STATUS_SUCCESS: u16 = 0x0000;

/// Sentinel while an operation is in flight
pub const STATUS_BUSY: u16 = 0x0001;

/// Transport reported a bus error
pub const STATUS_TRANSPORT_ERROR: u16 = 0x8001;

/// Transport arbiter was busy
pub const STATUS_TRANSPORT_BUSY: u16 = 0x8002;

/// Resolved by a timeout rather than by the peer
pub const STATUS_TIMEOUT: u16 = 0x8003;

/// Session failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Operation could not be issued
    Rejected(u16),
    /// Operation completed with an error status
    Failed(u16),
    /// Caller stopped waiting; the operation may still complete later
    TimedOut,
}

/// Status code published for a transport event
pub fn status_for_event(event: TransportEvent) -> u16 {
    match event {
        TransportEvent::Success => STATUS_SUCCESS,
        TransportEvent::Error => STATUS_TRANSPORT_ERROR,
        TransportEvent::Busy => STATUS_TRANSPORT_BUSY,
    }
}

/// Single-assignment completion status
///
/// Written once per armed operation by the completion side, read by the
/// waiting side. Before the first [`arm`](Self::arm) it reads as success.
pub struct Completion<M: RawMutex> {
    status: AtomicU16,
    signal: Signal<M, ()>,
}

impl<M: RawMutex> Default for Completion<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Completion<M> {
    /// Create an unarmed completion
    pub const fn new() -> Self {
        Self {
            status: AtomicU16::new(STATUS_SUCCESS),
            signal: Signal::new(),
        }
    }

    /// Reset to the Busy sentinel before issuing an operation
    pub fn arm(&self) {
        self.signal.reset();
        self.status.store(STATUS_BUSY, Ordering::Release);
    }

    /// Publish the final status of the armed operation
    ///
    /// Returns `false` if the status was already resolved or `code` is the
    /// Busy sentinel; the stored value is left unchanged in both cases.
    pub fn complete(&self, code: u16) -> bool {
        if code == STATUS_BUSY {
            warn!("completion with busy sentinel ignored");
            return false;
        }

        match self
            .status
            .compare_exchange(STATUS_BUSY, code, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.signal.signal(());
                true
            }
            Err(previous) => {
                warn!(
                    "completion {=u16:#x} dropped, already resolved to {=u16:#x}",
                    code,
                    previous
                );
                false
            }
        }
    }

    /// Publish a transport event
    pub fn complete_event(&self, event: TransportEvent) -> bool {
        self.complete(status_for_event(event))
    }

    /// Resolve a stuck operation with an error code
    pub fn force_error(&self, code: u16) -> bool {
        self.complete(code)
    }

    /// Final status, or `None` while busy
    pub fn poll(&self) -> Option<u16> {
        match self.status.load(Ordering::Acquire) {
            STATUS_BUSY => None,
            status => Some(status),
        }
    }

    /// Whether the armed operation is still pending
    pub fn is_busy(&self) -> bool {
        self.poll().is_none()
    }

    /// Spin until resolved
    pub fn wait_blocking(&self) -> u16 {
        self.wait_blocking_with(core::hint::spin_loop)
    }

    /// Poll until resolved, calling `relax` between polls
    ///
    /// `relax` is where a caller yields to its scheduler.
    pub fn wait_blocking_with(&self, mut relax: impl FnMut()) -> u16 {
        loop {
            if let Some(status) = self.poll() {
                return status;
            }
            relax();
        }
    }

    /// Poll until resolved or `timeout_ms` has passed
    pub fn wait_until<T: TickSource>(
        &self,
        clock: &MonotonicClock<T>,
        timeout_ms: u32,
    ) -> Result<u16, SessionError> {
        let start = clock.now_ms();
        loop {
            if let Some(status) = self.poll() {
                return Ok(status);
            }
            if clock.has_elapsed(start, timeout_ms) {
                warn!("gave up waiting after {}ms", timeout_ms);
                return Err(SessionError::TimedOut);
            }
            core::hint::spin_loop();
        }
    }

    /// Completion handler that publishes transport events here
    pub fn handler(&self) -> impl CompletionHandler + '_ {
        move |event: TransportEvent| {
            self.complete_event(event);
        }
    }

    /// Wait without spinning
    pub async fn wait(&self) -> u16 {
        loop {
            if let Some(status) = self.poll() {
                return status;
            }
            self.signal.wait().await;
        }
    }
}

/// Synchronous call sequence over a [`Completion`]
///
/// Each `run` arms the completion, issues the operation, bails out if it
/// was not accepted, waits for the result and maps it to a `Result`.
pub struct Session<'a, M: RawMutex> {
    completion: &'a Completion<M>,
}

impl<'a, M: RawMutex> Session<'a, M> {
    pub fn new(completion: &'a Completion<M>) -> Self {
        Self { completion }
    }

    /// The completion this session waits on
    pub fn completion(&self) -> &'a Completion<M> {
        self.completion
    }

    /// Issue and spin until done
    pub fn run<F>(&self, issue: F) -> Result<(), SessionError>
    where
        F: FnOnce() -> Result<(), u16>,
    {
        self.completion.arm();
        issue().map_err(SessionError::Rejected)?;
        check(self.completion.wait_blocking())
    }

    /// Issue and wait at most `timeout_ms`
    pub fn run_until<T, F>(
        &self,
        clock: &MonotonicClock<T>,
        timeout_ms: u32,
        issue: F,
    ) -> Result<(), SessionError>
    where
        T: TickSource,
        F: FnOnce() -> Result<(), u16>,
    {
        self.completion.arm();
        issue().map_err(SessionError::Rejected)?;
        check(self.completion.wait_until(clock, timeout_ms)?)
    }

    /// Issue and await the result
    pub async fn run_async<F>(&self, issue: F) -> Result<(), SessionError>
    where
        F: FnOnce() -> Result<(), u16>,
    {
        self.completion.arm();
        issue().map_err(SessionError::Rejected)?;
        check(self.completion.wait().await)
    }
}

fn check(status: u16) -> Result<(), SessionError> {
    match status {
        STATUS_SUCCESS => Ok(()),
        code => Err(SessionError::Failed(code)),
    }
}
