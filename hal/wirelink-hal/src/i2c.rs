//! Two-wire (I2C) bus abstractions
//!
//! The [`TwoWire`] trait models a buffered bus master in the style of
//! most microcontroller I2C peripherals: outgoing bytes are staged
//! between [`TwoWire::begin_transaction`] and [`TwoWire::end_transaction`],
//! incoming bytes are staged by [`TwoWire::request_bytes`] and drained
//! one at a time. The staging buffer has a fixed size, reported by
//! [`TwoWire::max_buffer_size`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transaction byte cap used when a platform does not report one
pub const DEFAULT_BUFFER_SIZE: usize = 32;

/// Data/clock line assignment for buses with per-instance pin routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusPins {
    /// Data line (SDA) GPIO number
    pub sda: u8,
    /// Clock line (SCL) GPIO number
    pub scl: u8,
}

impl BusPins {
    /// Create a new pin assignment
    pub const fn new(sda: u8, scl: u8) -> Self {
        Self { sda, scl }
    }
}

/// Status reported when a write transaction is ended
///
/// Numeric codes follow the convention shared by most two-wire
/// drivers: zero is success, anything else is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EndStatus {
    /// Transaction completed and was acknowledged
    Success = 0,
    /// Staged data did not fit the transmit buffer
    DataTooLong = 1,
    /// Address byte was not acknowledged
    AddressNack = 2,
    /// A data byte was not acknowledged
    DataNack = 3,
    /// Any other bus error
    Other = 4,
    /// Bus timed out
    Timeout = 5,
}

impl EndStatus {
    /// Get the status as its numeric code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Create a status from a numeric code
    ///
    /// Unknown codes map to [`EndStatus::Other`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => EndStatus::Success,
            1 => EndStatus::DataTooLong,
            2 => EndStatus::AddressNack,
            3 => EndStatus::DataNack,
            5 => EndStatus::Timeout,
            _ => EndStatus::Other,
        }
    }

    /// Check whether the transaction succeeded
    pub fn is_success(self) -> bool {
        self == EndStatus::Success
    }
}

/// Buffered two-wire bus master
///
/// One implementation may be shared by several device handles, each
/// talking to a different address. Implementations perform a single
/// bounded transaction per call and never retry on their own.
pub trait TwoWire {
    /// Start the bus, optionally routing it to specific pins
    ///
    /// Returns `false` if the peripheral refused to start.
    fn begin(&mut self, pins: Option<BusPins>) -> bool;

    /// Release the bus peripheral
    ///
    /// Only called when [`TwoWire::supports_shutdown`] is `true`.
    fn end(&mut self);

    /// Change the bus clock frequency in Hz
    ///
    /// Only called when [`TwoWire::supports_clock_change`] is `true`.
    fn set_clock(&mut self, frequency: u32);

    /// Open a write transaction to the given 7-bit address
    fn begin_transaction(&mut self, address: u8);

    /// Stage bytes for the open transaction
    ///
    /// Returns how many bytes were accepted.
    fn write_bytes(&mut self, data: &[u8]) -> usize;

    /// Transmit the staged bytes and close the transaction
    ///
    /// With `send_stop == false` the bus is held for a repeated start.
    /// Drivers that defer the bytes must still report an absent peer
    /// here rather than with a later call.
    fn end_transaction(&mut self, send_stop: bool) -> EndStatus;

    /// Request `count` bytes from the given address
    ///
    /// Received bytes are staged and reported by [`TwoWire::available`].
    /// Returns the number of bytes staged by this call.
    fn request_bytes(&mut self, address: u8, count: usize, send_stop: bool) -> usize;

    /// Number of staged bytes not yet read
    fn available(&self) -> usize;

    /// Pop the next staged byte
    fn read_byte(&mut self) -> Option<u8>;

    /// Largest number of bytes a single transaction can carry
    fn max_buffer_size(&self) -> usize {
        DEFAULT_BUFFER_SIZE
    }

    /// Whether [`TwoWire::end`] safely releases the bus
    ///
    /// Platforms whose bus is a process-wide singleton return `false`.
    fn supports_shutdown(&self) -> bool {
        true
    }

    /// Whether the clock can be changed after construction
    fn supports_clock_change(&self) -> bool {
        true
    }
}

impl<T: TwoWire + ?Sized> TwoWire for &mut T {
    fn begin(&mut self, pins: Option<BusPins>) -> bool {
        T::begin(self, pins)
    }

    fn end(&mut self) {
        T::end(self)
    }

    fn set_clock(&mut self, frequency: u32) {
        T::set_clock(self, frequency)
    }

    fn begin_transaction(&mut self, address: u8) {
        T::begin_transaction(self, address)
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        T::write_bytes(self, data)
    }

    fn end_transaction(&mut self, send_stop: bool) -> EndStatus {
        T::end_transaction(self, send_stop)
    }

    fn request_bytes(&mut self, address: u8, count: usize, send_stop: bool) -> usize {
        T::request_bytes(self, address, count, send_stop)
    }

    fn available(&self) -> usize {
        T::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        T::read_byte(self)
    }

    fn max_buffer_size(&self) -> usize {
        T::max_buffer_size(self)
    }

    fn supports_shutdown(&self) -> bool {
        T::supports_shutdown(self)
    }

    fn supports_clock_change(&self) -> bool {
        T::supports_clock_change(self)
    }
}

/// Bus speed settings applied through [`TwoWire::set_clock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self::new(100_000);

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self::new(400_000);

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self::new(1_000_000);

    /// Custom clock frequency in Hz
    pub const fn new(frequency: u32) -> Self {
        Self { frequency }
    }
}
