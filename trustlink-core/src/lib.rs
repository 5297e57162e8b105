//! Board-agnostic platform layer for a secure-element command library
//!
//! This crate contains everything between the command library and the
//! chip HAL that does not depend on a specific microcontroller:
//!
//! - Bus driver framing a fixed peer address ([`bus`])
//! - Bus arbiter with bounded write retry and completion callback ([`transport`])
//! - Lazily created, re-armable one-shot event timer ([`event`])
//! - Monotonic clock and performance stopwatch ([`clock`])
//! - Reset/power line control ([`gpio`])
//! - Completion status bridge for synchronous callers ([`session`])
//! - Host-side data store for persisted contexts ([`datastore`])
//! - Configuration type definitions ([`config`])

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bus;
pub mod clock;
pub mod config;
pub mod datastore;
pub mod event;
pub mod gpio;
pub mod session;
pub mod transport;

pub use config::{EventConfig, ResetTiming, TransportConfig};
pub use event::{Arming, EventError, EventState, OneShotEvent, SharedEvent};
pub use session::{Completion, Session, SessionError};
pub use transport::{Arbitration, ArbitrationToken, CompletionHandler, Transport, TransportError, TransportEvent};
