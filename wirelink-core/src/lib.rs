//! Chunked transfers over a shared two-wire bus
//!
//! This crate contains the transport logic that sits between device
//! drivers and a [`TwoWire`](wirelink_hal::TwoWire) bus:
//!
//! - Device handle lifecycle (start, probe, shutdown)
//! - Segmentation of long reads into bus-buffer-sized pieces
//! - Timeout-bounded polling for each read segment
//! - Single-transaction writes with guaranteed bus release
//! - Device configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod error;
pub mod segment;

#[cfg(test)]
mod mock;

pub use config::{ConfigError, DeviceConfig, DEFAULT_TIMEOUT_MS};
pub use device::I2cDevice;
pub use error::TransferError;
pub use segment::{Segment, SegmentPlan};
