//! GPIO abstractions
//!
//! Output control addressed by port and pin number, the way SoC GPIO
//! drivers expose it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    #[default]
    Low,
    High,
}

/// Electrical drive mode of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DriveMode {
    /// Strong drive both ways
    #[default]
    PushPull,
    /// Drives low, floats high
    OpenDrain,
}

/// Pin electrical configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// Drive mode
    pub drive_mode: DriveMode,
    /// Level driven right after initialization
    pub initial_level: Level,
}

impl PinConfig {
    /// Push-pull output starting at `level`
    pub const fn push_pull(level: Level) -> Self {
        Self {
            drive_mode: DriveMode::PushPull,
            initial_level: level,
        }
    }
}

/// GPIO port controller
///
/// Implementations handle the register manipulation for the specific chip.
pub trait GpioController {
    /// Error type for pin initialization
    type Error;

    /// Program the electrical configuration of `port`/`pin`
    fn init_pin(&mut self, port: u8, pin: u8, config: &PinConfig) -> Result<(), Self::Error>;

    /// Drive `port`/`pin` high
    fn set(&mut self, port: u8, pin: u8);

    /// Drive `port`/`pin` low
    fn clear(&mut self, port: u8, pin: u8);
}
