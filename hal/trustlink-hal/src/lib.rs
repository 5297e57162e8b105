//! TrustLink Hardware Abstraction Layer
//!
//! This crate defines the downward interfaces of the secure-element
//! platform layer. Chip-specific crates implement them so the transport,
//! event timer and GPIO control in `trustlink-core` run unchanged on
//! different hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Secure-element command library         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trustlink-core (arbiter, event timer)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trustlink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  trustlink-   │       │  trustlink-   │
//! │  hal-rp2040   │       │   drivers     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cMaster`] - Raw I2C master transactions
//! - [`gpio::GpioController`] - Port/pin output control
//! - [`timer::TimerService`] - RTOS one-shot timer facility
//! - [`clock::TickSource`] - Millisecond uptime counter

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod i2c;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use clock::TickSource;
pub use gpio::{DriveMode, GpioController, Level, PinConfig};
pub use i2c::{BusFault, I2cConfig, I2cMaster};
pub use timer::TimerService;
