//! Configuration types
//!
//! Tunables of the transport, event timer and reset sequencing. Board
//! crates build these once at startup; nothing here is changed afterwards.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit address of the secure element
pub const DEFAULT_PEER_ADDRESS: u8 = 0x30;

/// Default number of write attempts before reporting an error
pub const DEFAULT_WRITE_ATTEMPTS: u8 = 3;

/// Default pause between write attempts (µs)
pub const DEFAULT_RETRY_DELAY_US: u32 = 100;

/// Highest bitrate the peer supports (kHz)
pub const MAX_BITRATE_KHZ: u16 = 400;

/// Delay used by `OneShotEvent::start` (µs)
pub const DEFAULT_EVENT_DELAY_US: u32 = 1000;

/// Transport (bus arbiter) configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransportConfig {
    /// 7-bit address of the peer
    pub peer_address: u8,
    /// Write attempts per call, including the first (min 1)
    pub max_write_attempts: u8,
    /// Pause between two write attempts (µs)
    pub retry_delay_us: u32,
    /// End every transfer with a stop condition
    pub send_stop: bool,
    /// Bitrate programmed at init (kHz)
    pub bitrate_khz: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_ADDRESS)
    }
}

impl TransportConfig {
    /// Defaults for a peer at `peer_address`
    pub const fn new(peer_address: u8) -> Self {
        Self {
            peer_address,
            max_write_attempts: DEFAULT_WRITE_ATTEMPTS,
            retry_delay_us: DEFAULT_RETRY_DELAY_US,
            send_stop: true,
            bitrate_khz: MAX_BITRATE_KHZ,
        }
    }

    /// Same config with a different retry policy
    pub const fn with_retry(mut self, attempts: u8, delay_us: u32) -> Self {
        self.max_write_attempts = attempts;
        self.retry_delay_us = delay_us;
        self
    }

    /// Attempts actually made; a zero setting still tries once
    pub fn write_attempts(&self) -> u8 {
        self.max_write_attempts.max(1)
    }
}

/// One-shot event timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventConfig {
    /// Delay armed by `start` (µs)
    pub default_delay_us: u32,
    /// Name handed to the RTOS timer facility
    pub timer_name: &'static str,
}

impl EventConfig {
    /// Default configuration, usable in statics
    pub const DEFAULT: Self = Self {
        default_delay_us: DEFAULT_EVENT_DELAY_US,
        timer_name: "trustlink_event",
    };
}

impl Default for EventConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reset and power sequencing timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResetTiming {
    /// Time the reset line is held low (µs)
    pub reset_low_us: u32,
    /// Time between power-on and reset release (ms)
    pub power_settle_ms: u32,
    /// Time the peer needs after reset release (ms)
    pub startup_ms: u32,
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self {
            reset_low_us: 2000,
            power_settle_ms: 10,
            startup_ms: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.peer_address, 0x30);
        assert_eq!(config.max_write_attempts, 3);
        assert_eq!(config.retry_delay_us, 100);
        assert!(config.send_stop);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let config = TransportConfig::default().with_retry(0, 0);
        assert_eq!(config.write_attempts(), 1);
    }
}
