//! I2C bus abstractions
//!
//! Raw master transaction primitives. Implementations own the
//! start/restart/stop framing on the wire; callers only choose whether a
//! transfer ends with a stop condition.

use embedded_hal::i2c::ErrorKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// I2C bus master
///
/// One instance drives one physical bus. The transport layer guarantees
/// that at most one transaction is in flight at a time.
pub trait I2cMaster {
    /// Driver-specific error, reduced to [`BusFault`] by the transport
    type Error: Into<BusFault>;

    /// Write `data` to the device at `address`
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    /// * `send_stop` - Generate a stop condition after the last byte
    fn master_write(&mut self, address: u8, data: &[u8], send_stop: bool)
        -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes from the device at `address`
    ///
    /// The last byte is NACKed by the master.
    fn master_read(&mut self, address: u8, buf: &mut [u8], send_stop: bool)
        -> Result<(), Self::Error>;

    /// Bring the peripheral into a known state
    ///
    /// Called on every transport init. The default does nothing, for
    /// peripherals configured once at board bring-up.
    fn configure(&mut self, _config: &I2cConfig) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Failure reported by an I2C peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// Bus error (misplaced start/stop)
    Bus,
    /// Arbitration lost to another master
    ArbitrationLost,
    /// Address or data byte not acknowledged
    Nack,
    /// Peripheral did not finish in time
    Timeout,
    /// Data overrun
    Overrun,
    /// Other error
    Other,
}

impl From<ErrorKind> for BusFault {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => BusFault::Bus,
            ErrorKind::ArbitrationLoss => BusFault::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => BusFault::Nack,
            ErrorKind::Overrun => BusFault::Overrun,
            _ => BusFault::Other,
        }
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Configuration for a bitrate given in kHz
    pub const fn from_khz(khz: u16) -> Self {
        Self {
            frequency: khz as u32 * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(BusFault::from(ErrorKind::Bus), BusFault::Bus);
        assert_eq!(
            BusFault::from(ErrorKind::ArbitrationLoss),
            BusFault::ArbitrationLost
        );
        assert_eq!(
            BusFault::from(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            BusFault::Nack
        );
        assert_eq!(BusFault::from(ErrorKind::Overrun), BusFault::Overrun);
        assert_eq!(BusFault::from(ErrorKind::Other), BusFault::Other);
    }

    #[test]
    fn test_config_from_khz() {
        assert_eq!(I2cConfig::from_khz(400), I2cConfig::FAST);
        assert_eq!(I2cConfig::from_khz(100), I2cConfig::STANDARD);
    }
}
