//! Two-wire bus driver implementations
//!
//! This crate provides concrete implementations of the
//! [`TwoWire`](wirelink_hal::TwoWire) trait and the clock hook:
//!
//! - [`WireAdapter`] - buffered driver over any `embedded_hal::i2c::I2c`
//! - [`SharedBus`] - one physical bus shared by several device handles
//! - `EmbassyClock` - millisecond clock from `embassy-time` (feature `embassy-time`)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "embassy-time")]
pub mod clock;
pub mod shared;
pub mod wire;

#[cfg(test)]
mod fake;

#[cfg(feature = "embassy-time")]
pub use clock::EmbassyClock;
pub use shared::{shared_device, BusCell, SharedBus};
pub use wire::{WireAdapter, WireError};
