//! RP2040 platform bindings for the secure-element transport
//!
//! Wires the board-agnostic pieces of `trustlink-core` to Embassy on the
//! RP2040:
//!
//! - Millisecond uptime from `embassy_time::Instant` ([`clock`])
//! - One-shot timer service driven by an async timer task ([`timer`])
//! - Blocking I2C bus and reset/power lines from `embassy_rp` ([`board`])
//!
//! Delays come straight from `embassy_time::Delay`, which implements
//! `embedded_hal::delay::DelayNs`.

#![no_std]
#![deny(unsafe_code)]

pub mod board;
pub mod clock;
pub mod timer;

pub use board::{control_lines, secure_element_bus, SecureElementBus, CONTROL_PORT, RESET_PIN, VDD_PIN};
pub use clock::EmbassyTicks;
pub use timer::{run_oneshot_timer, EmbassyTimerService, SystemEvent, TimerCommand, TimerCommands};
