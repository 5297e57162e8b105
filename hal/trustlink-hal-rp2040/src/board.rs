//! Board bring-up for the secure element
//!
//! The element hangs off one I2C controller with optional VDD and reset
//! lines driven from plain GPIOs.

use embassy_rp::gpio::{Level, Output, Pin};
use embassy_rp::i2c::{self, Blocking, I2c, Instance, SclPin, SdaPin};
use embassy_rp::Peri;
use trustlink_core::config::TransportConfig;
use trustlink_core::gpio::{GpioLine, LineDescriptor, SecureElementLines};
use trustlink_drivers::{EhI2c, OutputBank};
use trustlink_hal::{I2cConfig, Level as LineLevel, PinConfig};

/// Port number the control lines answer to
pub const CONTROL_PORT: u8 = 0;
/// Index of the VDD line in the control bank
pub const VDD_PIN: u8 = 0;
/// Index of the reset line in the control bank
pub const RESET_PIN: u8 = 1;

/// I2C bus as seen by the transport
pub type SecureElementBus<'d, T> = EhI2c<I2c<'d, T, Blocking>>;

/// Set up a blocking I2C controller at the configured bitrate
pub fn secure_element_bus<'d, T: Instance>(
    peri: Peri<'d, T>,
    scl: Peri<'d, impl SclPin<T>>,
    sda: Peri<'d, impl SdaPin<T>>,
    config: &TransportConfig,
) -> SecureElementBus<'d, T> {
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2cConfig::from_khz(config.bitrate_khz).frequency;
    EhI2c::new(I2c::new_blocking(peri, scl, sda, i2c_config))
}

/// Claim the VDD and reset pins as a GPIO bank plus matching line set
///
/// Both lines start low, so the element is unpowered and held in reset
/// until the first cold reset.
pub fn control_lines<'d>(
    vdd: Peri<'d, impl Pin>,
    reset: Peri<'d, impl Pin>,
) -> (OutputBank<Output<'d>, 2>, SecureElementLines) {
    let bank = OutputBank::new(
        CONTROL_PORT,
        [Output::new(vdd, Level::Low), Output::new(reset, Level::Low)],
    );
    let lines = SecureElementLines {
        vdd: GpioLine::new(descriptor(VDD_PIN)),
        reset: GpioLine::new(descriptor(RESET_PIN)),
    };
    (bank, lines)
}

fn descriptor(pin: u8) -> LineDescriptor {
    LineDescriptor {
        port: CONTROL_PORT,
        pin,
        config: PinConfig::push_pull(LineLevel::Low),
    }
}
