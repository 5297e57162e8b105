//! GPIO control for the secure element's reset and power lines
//!
//! A line is bound to a port/pin/config triple at startup, or marked
//! absent on boards that do not wire it. Only `init` reports anything:
//! driving an absent line is a silent no-op.

use embedded_hal::delay::DelayNs;
use trustlink_hal::{GpioController, PinConfig};

use crate::config::ResetTiming;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GPIO control error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Line has no pin assigned
    Absent,
    /// Pin driver rejected the configuration
    Driver,
}

/// Physical binding of a logical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineDescriptor {
    pub port: u8,
    pub pin: u8,
    pub config: PinConfig,
}

/// One logical output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioLine {
    descriptor: Option<LineDescriptor>,
}

impl GpioLine {
    /// Line bound to a pin
    pub const fn new(descriptor: LineDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
        }
    }

    /// Line not wired on this board
    pub const fn absent() -> Self {
        Self { descriptor: None }
    }

    /// Whether a pin is assigned
    pub fn is_present(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Pin binding, if any
    pub fn descriptor(&self) -> Option<&LineDescriptor> {
        self.descriptor.as_ref()
    }

    /// Program the pin's electrical configuration
    pub fn init<G: GpioController>(&self, gpio: &mut G) -> Result<(), GpioError> {
        let line = self.descriptor.as_ref().ok_or(GpioError::Absent)?;
        gpio.init_pin(line.port, line.pin, &line.config).map_err(|_| {
            warn!("gpio init failed on port {} pin {}", line.port, line.pin);
            GpioError::Driver
        })
    }

    /// Leave the pin as it is
    pub fn deinit(&self) -> Result<(), GpioError> {
        Ok(())
    }

    /// Drive the line high; no-op when absent
    pub fn set_high<G: GpioController>(&self, gpio: &mut G) {
        if let Some(line) = &self.descriptor {
            gpio.set(line.port, line.pin);
        }
    }

    /// Drive the line low; no-op when absent
    pub fn set_low<G: GpioController>(&self, gpio: &mut G) {
        if let Some(line) = &self.descriptor {
            gpio.clear(line.port, line.pin);
        }
    }
}

/// Control lines of the secure element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecureElementLines {
    /// Supply enable
    pub vdd: GpioLine,
    /// Active-low reset
    pub reset: GpioLine,
}

impl SecureElementLines {
    /// Initialize the wired lines; absent ones are skipped
    pub fn init<G: GpioController>(&self, gpio: &mut G) -> Result<(), GpioError> {
        for line in [&self.vdd, &self.reset] {
            if line.is_present() {
                line.init(gpio)?;
            }
        }
        Ok(())
    }

    /// Power-cycle and reset the peer
    pub fn cold_reset<G, D>(&self, gpio: &mut G, delay: &mut D, timing: &ResetTiming)
    where
        G: GpioController,
        D: DelayNs,
    {
        self.vdd.set_low(gpio);
        self.reset.set_low(gpio);
        delay.delay_us(timing.reset_low_us);

        self.vdd.set_high(gpio);
        delay.delay_ms(timing.power_settle_ms);

        self.reset.set_high(gpio);
        delay.delay_ms(timing.startup_ms);
    }

    /// Pulse reset with power left on
    pub fn warm_reset<G, D>(&self, gpio: &mut G, delay: &mut D, timing: &ResetTiming)
    where
        G: GpioController,
        D: DelayNs,
    {
        self.reset.set_low(gpio);
        delay.delay_us(timing.reset_low_us);
        self.reset.set_high(gpio);
        delay.delay_ms(timing.startup_ms);
    }
}
