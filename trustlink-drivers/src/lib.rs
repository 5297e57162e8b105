//! Hardware driver implementations
//!
//! Adapters from embedded-hal 1.0 peripherals to the platform traits in
//! trustlink-hal, so any board with an embedded-hal I2C driver and output
//! pins can host the transport:
//!
//! - [`i2c::EhI2c`] - blocking `embedded_hal::i2c::I2c` as an [`trustlink_hal::I2cMaster`]
//! - [`gpio::OutputBank`] - a port of `OutputPin`s as a [`trustlink_hal::GpioController`]

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

pub use gpio::{OutputBank, PinFault};
pub use i2c::EhI2c;
