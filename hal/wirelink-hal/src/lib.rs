//! Wirelink Hardware Abstraction Layer
//!
//! This crate defines the contract between the chunked transfer engine
//! and whatever actually drives the two-wire bus. Chip HALs, host
//! simulators and test mocks implement these traits; `wirelink-core`
//! only ever talks to them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers (sensors, displays...)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wirelink-core (chunked transfers)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wirelink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ WireAdapter   │       │  SharedBus    │
//! │ (embedded-hal)│       │ (mutex cell)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::TwoWire`] - Buffered, transaction-oriented bus driver
//! - [`time::Clock`] - Monotonic millisecond clock
//! - [`time::YieldPoint`] - Cooperative yield inside polling loops

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod time;

// Re-export key traits at crate root for convenience
pub use i2c::{BusPins, EndStatus, I2cConfig, TwoWire, DEFAULT_BUFFER_SIZE};
pub use time::{Clock, NoYield, YieldPoint};
