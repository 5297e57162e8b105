//! Bus arbiter (transport)
//!
//! Serializes access to the bus driver, retries writes a bounded number
//! of times, and reports the outcome of every call through exactly one
//! invocation of the registered [`CompletionHandler`]. The return value
//! of each entry point mirrors what the handler was told.
//!
//! The arbitration token never blocks: a second acquire while held is
//! denied and the call resolves to [`TransportEvent::Busy`]. Retrying
//! a Busy outcome is the caller's business.

use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicBool, Ordering};
use trustlink_hal::{BusFault, I2cConfig, I2cMaster};

use crate::bus::BusDriver;
use crate::config::TransportConfig;

/// Outcome delivered to the upper layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// Transfer completed
    Success,
    /// Transfer failed on the bus
    Error,
    /// Arbiter already held; nothing was sent
    Busy,
}

/// Error returned by transport operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Bus-level failure (NACK, arbitration loss, timeout, ...)
    Bus(BusFault),
    /// Arbiter already held
    Busy,
}

impl TransportError {
    /// Event the handler receives for this error
    pub fn event(&self) -> TransportEvent {
        match self {
            TransportError::Bus(_) => TransportEvent::Error,
            TransportError::Busy => TransportEvent::Busy,
        }
    }
}

/// Result of an acquire attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arbitration {
    Granted,
    Denied,
}

/// Single-holder flag guarding one bus
///
/// Not a lock: contention is reported, never waited on, and the holder is
/// not tracked, so it is not reentrant either.
#[derive(Debug, Default)]
pub struct ArbitrationToken {
    held: AtomicBool,
}

impl ArbitrationToken {
    /// A free token
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Take the token if it is free
    pub fn acquire(&self) -> Arbitration {
        match self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
        {
            Ok(_) => Arbitration::Granted,
            Err(_) => Arbitration::Denied,
        }
    }

    /// Free the token; idempotent
    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    /// Check whether someone holds the token
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

/// Receiver of transport completions
///
/// Runs in whatever context finished the transfer, which may be an
/// interrupt handler: implementations must not block.
pub trait CompletionHandler {
    fn on_complete(&mut self, event: TransportEvent);
}

impl<F: FnMut(TransportEvent)> CompletionHandler for F {
    fn on_complete(&mut self, event: TransportEvent) {
        self(event)
    }
}

/// Transport context for one physical bus
///
/// Owns the bus driver, the arbitration token and the upper layer's
/// completion handler. Create one per bus at startup and pass it by
/// reference to whoever issues transfers.
pub struct Transport<B, D, H> {
    driver: BusDriver<B>,
    delay: D,
    handler: H,
    token: ArbitrationToken,
    config: TransportConfig,
    requested_bitrate_khz: u16,
}

impl<B, D, H> Transport<B, D, H>
where
    B: I2cMaster,
    D: DelayNs,
    H: CompletionHandler,
{
    /// Create a transport talking to `config.peer_address` over `bus`
    ///
    /// `delay` paces the write retries.
    pub fn new(bus: B, delay: D, handler: H, config: TransportConfig) -> Self {
        Self {
            driver: BusDriver::new(bus, config.peer_address, config.send_stop),
            delay,
            handler,
            token: ArbitrationToken::new(),
            config,
            requested_bitrate_khz: config.bitrate_khz,
        }
    }

    /// Configure the peripheral
    ///
    /// Safe to call repeatedly; each init starts from a clean peripheral.
    pub fn init(&mut self) -> Result<(), TransportError> {
        let config = I2cConfig::from_khz(self.config.bitrate_khz);
        self.driver.configure(&config).map_err(|fault| {
            error!("transport init failed: {}", fault);
            TransportError::Bus(fault)
        })?;
        debug!(
            "transport ready, peer={=u8:#x} bitrate={}kHz",
            self.config.peer_address,
            self.config.bitrate_khz
        );
        Ok(())
    }

    /// Nothing to undo: the next init reconfigures the peripheral
    pub fn deinit(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Accept a bitrate request
    ///
    /// The bitrate is fixed at provisioning time, so the request is only
    /// recorded.
    pub fn set_bitrate(&mut self, khz: u16) -> Result<(), TransportError> {
        debug!(
            "bitrate request {}kHz ignored, running at {}kHz",
            khz,
            self.config.bitrate_khz
        );
        self.requested_bitrate_khz = khz;
        Ok(())
    }

    /// Last bitrate requested by the upper layer (kHz)
    pub fn requested_bitrate(&self) -> u16 {
        self.requested_bitrate_khz
    }

    /// Try to take exclusive use of the bus
    pub fn acquire(&self) -> Arbitration {
        self.token.acquire()
    }

    /// Give up exclusive use of the bus; idempotent
    pub fn release(&self) {
        self.token.release();
    }

    /// Check whether the arbiter is currently held
    pub fn is_held(&self) -> bool {
        self.token.is_held()
    }

    /// Write `data` to the peer
    ///
    /// Retries failed attempts up to the configured bound, pausing between
    /// attempts. The handler is told the final outcome once.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.token.acquire() == Arbitration::Denied {
            debug!("write denied, bus busy");
            self.handler.on_complete(TransportEvent::Busy);
            return Err(TransportError::Busy);
        }

        let result = self.write_with_retry(data);
        self.token.release();

        match result {
            Ok(()) => {
                self.handler.on_complete(TransportEvent::Success);
                Ok(())
            }
            Err(fault) => {
                error!("write of {} bytes failed: {}", data.len(), fault);
                self.handler.on_complete(TransportEvent::Error);
                Err(TransportError::Bus(fault))
            }
        }
    }

    /// Fill `buf` from the peer
    ///
    /// Single attempt. The token is released after the handler has run on
    /// every path, the Busy one included, so a read also clears a hold it
    /// did not take.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let result = match self.token.acquire() {
            Arbitration::Denied => {
                debug!("read denied, bus busy");
                self.handler.on_complete(TransportEvent::Busy);
                Err(TransportError::Busy)
            }
            Arbitration::Granted => match self.driver.read(buf) {
                Ok(()) => {
                    self.handler.on_complete(TransportEvent::Success);
                    Ok(())
                }
                Err(fault) => {
                    warn!("read of {} bytes failed: {}", buf.len(), fault);
                    self.handler.on_complete(TransportEvent::Error);
                    Err(TransportError::Bus(fault))
                }
            },
        };

        self.token.release();
        result
    }

    fn write_with_retry(&mut self, data: &[u8]) -> Result<(), BusFault> {
        let attempts = self.config.write_attempts();
        let mut attempt = 1;

        loop {
            match self.driver.write(data) {
                Ok(()) => return Ok(()),
                Err(fault) if attempt >= attempts => return Err(fault),
                Err(fault) => {
                    warn!("write attempt {}/{} failed: {}", attempt, attempts, fault);
                    self.delay.delay_us(self.config.retry_delay_us);
                    attempt += 1;
                }
            }
        }
    }

    /// Active configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Borrow the completion handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Borrow the bus driver
    pub fn driver(&self) -> &BusDriver<B> {
        &self.driver
    }

    /// Mutably borrow the bus driver
    pub fn driver_mut(&mut self) -> &mut BusDriver<B> {
        &mut self.driver
    }

    /// Mutably borrow the retry delay
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }
}
