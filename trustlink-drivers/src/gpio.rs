//! Output pin bank
//!
//! Exposes a fixed set of embedded-hal output pins as one GPIO port.

use embedded_hal::digital::OutputPin;
use trustlink_hal::{GpioController, Level, PinConfig};

/// Pin initialization failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFault {
    /// Port or pin number not in this bank
    UnknownPin,
    /// Pin driver refused the initial level
    Pin,
}

/// Output pins answering to a single port number
///
/// Pin numbers index into the array. The electrical drive mode is fixed
/// when the pins are constructed; `init_pin` only drives the initial level.
pub struct OutputBank<P, const N: usize> {
    port: u8,
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> OutputBank<P, N> {
    pub fn new(port: u8, pins: [P; N]) -> Self {
        Self { port, pins }
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    fn pin_mut(&mut self, port: u8, pin: u8) -> Option<&mut P> {
        if port != self.port {
            return None;
        }
        self.pins.get_mut(pin as usize)
    }
}

impl<P: OutputPin, const N: usize> GpioController for OutputBank<P, N> {
    type Error = PinFault;

    fn init_pin(&mut self, port: u8, pin: u8, config: &PinConfig) -> Result<(), PinFault> {
        let p = self.pin_mut(port, pin).ok_or(PinFault::UnknownPin)?;
        let result = match config.initial_level {
            Level::High => p.set_high(),
            Level::Low => p.set_low(),
        };
        result.map_err(|_| PinFault::Pin)
    }

    fn set(&mut self, port: u8, pin: u8) {
        if let Some(p) = self.pin_mut(port, pin) {
            // Level writes on initialized pins do not fail on supported chips
            let _ = p.set_high();
        }
    }

    fn clear(&mut self, port: u8, pin: u8) {
        if let Some(p) = self.pin_mut(port, pin) {
            let _ = p.set_low();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Mock GPIO pin for testing
    #[derive(Default)]
    struct MockPin {
        high: bool,
        writes: u32,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }
    }

    fn bank() -> OutputBank<MockPin, 3> {
        OutputBank::new(1, Default::default())
    }

    #[test]
    fn test_init_drives_initial_level() {
        let mut bank = bank();
        bank.init_pin(1, 2, &PinConfig::push_pull(Level::High))
            .unwrap();
        assert!(bank.pins[2].high);

        bank.init_pin(1, 2, &PinConfig::push_pull(Level::Low))
            .unwrap();
        assert!(!bank.pins[2].high);
    }

    #[test]
    fn test_set_and_clear() {
        let mut bank = bank();
        bank.set(1, 0);
        assert!(bank.pins[0].high);
        bank.clear(1, 0);
        assert!(!bank.pins[0].high);
    }

    #[test]
    fn test_unknown_pin() {
        let mut bank = bank();
        assert_eq!(
            bank.init_pin(1, 3, &PinConfig::default()),
            Err(PinFault::UnknownPin)
        );
        assert_eq!(
            bank.init_pin(0, 0, &PinConfig::default()),
            Err(PinFault::UnknownPin)
        );

        // Writes to pins outside the bank are dropped
        bank.set(2, 0);
        assert!(bank.pins.iter().all(|p| p.writes == 0));
    }
}
