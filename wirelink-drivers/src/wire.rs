//! Buffered two-wire driver over `embedded-hal` I2C
//!
//! `embedded-hal` buses perform whole transactions in one call, while
//! the transfer engine speaks to a staging driver: bytes are queued
//! between `begin_transaction` and `end_transaction`, and reads are
//! staged before being drained. [`WireAdapter`] bridges the two with a
//! fixed-size transmit and receive buffer.
//!
//! # Repeated start
//!
//! A write ended with `send_stop == false` is held rather than sent.
//! The next request to the same address issues it together with the
//! read as one `write_read`, so the peer sees a repeated start. Any
//! other bus activity flushes the held write first.
//!
//! Before a write is held the adapter checks that the peer acknowledges
//! its address, so an absent peer fails the write itself. A data NACK
//! on the held bytes can only surface with the request that sends them.
//!
//! If that request fails, the held write is kept so a repeated request
//! reads the same register again. The next write to any peer drops it.
//!
//! `embedded-hal` always ends a read with a stop condition, so the stop
//! flag of `request_bytes` has no effect here.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use heapless::{Deque, Vec};
use wirelink_hal::{BusPins, EndStatus, TwoWire, DEFAULT_BUFFER_SIZE};

/// Error from the underlying I2C bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Bus error
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// Address not acknowledged
    AddressNack,
    /// Data byte not acknowledged
    DataNack,
    /// Overrun
    Overrun,
    /// Other error
    Other,
}

impl From<ErrorKind> for WireError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => WireError::Bus,
            ErrorKind::ArbitrationLoss => WireError::ArbitrationLost,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => WireError::DataNack,
            ErrorKind::NoAcknowledge(_) => WireError::AddressNack,
            ErrorKind::Overrun => WireError::Overrun,
            _ => WireError::Other,
        }
    }
}

impl From<WireError> for EndStatus {
    fn from(e: WireError) -> Self {
        match e {
            WireError::AddressNack => EndStatus::AddressNack,
            WireError::DataNack => EndStatus::DataNack,
            _ => EndStatus::Other,
        }
    }
}

/// Write held back for a repeated start
#[derive(Debug)]
struct HeldWrite<const N: usize> {
    address: u8,
    data: Vec<u8, N>,
    /// A request carrying this write already failed
    failed: bool,
}

/// Staging two-wire driver over an `embedded-hal` I2C bus
///
/// `N` is the per-transaction byte cap reported to the transfer engine.
/// Clock speed is fixed by whoever constructed the I2C peripheral, so
/// [`TwoWire::supports_clock_change`] is `false`.
pub struct WireAdapter<I2C, const N: usize = DEFAULT_BUFFER_SIZE> {
    i2c: I2C,
    started: bool,
    tx_address: Option<u8>,
    tx: Vec<u8, N>,
    tx_overflow: bool,
    held: Option<HeldWrite<N>>,
    rx: Deque<u8, N>,
    last_error: Option<WireError>,
}

impl<I2C, const N: usize> WireAdapter<I2C, N> {
    /// Wrap an I2C bus
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            started: false,
            tx_address: None,
            tx: Vec::new(),
            tx_overflow: false,
            held: None,
            rx: Deque::new(),
            last_error: None,
        }
    }

    /// Most recent error reported by the underlying bus
    pub fn last_error(&self) -> Option<WireError> {
        self.last_error
    }

    /// Borrow the underlying bus
    pub fn inner(&self) -> &I2C {
        &self.i2c
    }

    /// Mutably borrow the underlying bus
    pub fn inner_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Unwrap the underlying bus, dropping any staged data
    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c, const N: usize> WireAdapter<I2C, N> {
    fn record<T>(&mut self, result: Result<T, I2C::Error>) -> Result<T, WireError> {
        result.map_err(|e| {
            let error = WireError::from(e.kind());
            self.last_error = Some(error);
            #[cfg(feature = "defmt")]
            defmt::debug!("i2c bus error: {}", error);
            error
        })
    }

    /// Send a held write on its own
    fn flush_held(&mut self) -> Result<(), WireError> {
        match self.held.take() {
            Some(held) => {
                let result = self.i2c.write(held.address, &held.data);
                self.record(result)
            }
            None => Ok(()),
        }
    }
}

impl<I2C: I2c, const N: usize> TwoWire for WireAdapter<I2C, N> {
    fn begin(&mut self, pins: Option<BusPins>) -> bool {
        // Pin routing is fixed when the I2C peripheral is built
        if pins.is_some() {
            #[cfg(feature = "defmt")]
            defmt::debug!("i2c adapter: pin routing ignored, peripheral already configured");
        }
        self.started = true;
        true
    }

    fn end(&mut self) {
        self.started = false;
        self.tx_address = None;
        self.tx.clear();
        self.held = None;
        self.rx.clear();
    }

    fn set_clock(&mut self, _frequency: u32) {}

    fn begin_transaction(&mut self, address: u8) {
        self.tx_address = Some(address);
        self.tx.clear();
        self.tx_overflow = false;
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        let room = N - self.tx.len();
        let accepted = data.len().min(room);
        // Cannot fail, length checked above
        let _ = self.tx.extend_from_slice(&data[..accepted]);
        if accepted < data.len() {
            self.tx_overflow = true;
        }
        accepted
    }

    fn end_transaction(&mut self, send_stop: bool) -> EndStatus {
        let Some(address) = self.tx_address.take() else {
            return EndStatus::Other;
        };
        if !self.started {
            return EndStatus::Other;
        }
        if self.tx_overflow {
            return EndStatus::DataTooLong;
        }

        let held = match self.held.take() {
            // Register select of an abandoned read
            Some(held) if held.failed => None,
            Some(held) if held.address == address => Some(held),
            Some(other) => {
                self.held = Some(other);
                if let Err(e) = self.flush_held() {
                    return e.into();
                }
                None
            }
            None => None,
        };

        if !send_stop {
            if held.is_none() {
                let result = self.i2c.write(address, &[]);
                if let Err(e) = self.record(result) {
                    return e.into();
                }
            }

            // Merge with an earlier held write to the same peer
            let mut data = held.map(|h| h.data).unwrap_or_default();
            if data.extend_from_slice(&self.tx).is_err() {
                return EndStatus::DataTooLong;
            }
            self.held = Some(HeldWrite {
                address,
                data,
                failed: false,
            });
            return EndStatus::Success;
        }

        let result = match held {
            Some(held) => self.i2c.transaction(
                address,
                &mut [Operation::Write(&held.data), Operation::Write(&self.tx)],
            ),
            None => self.i2c.write(address, &self.tx),
        };

        match self.record(result) {
            Ok(()) => EndStatus::Success,
            Err(e) => e.into(),
        }
    }

    fn request_bytes(&mut self, address: u8, count: usize, _send_stop: bool) -> usize {
        self.rx.clear();
        if !self.started {
            return 0;
        }

        let count = count.min(N);
        let mut buf = [0u8; N];
        let read = &mut buf[..count];

        let result = match self.held.take() {
            Some(held) if held.address == address => {
                let result = self.i2c.write_read(address, &held.data, read);
                if result.is_err() {
                    self.held = Some(HeldWrite {
                        failed: true,
                        ..held
                    });
                }
                result
            }
            Some(held) if held.failed => self.i2c.read(address, read),
            other => {
                self.held = other;
                if self.flush_held().is_err() {
                    return 0;
                }
                self.i2c.read(address, read)
            }
        };

        if self.record(result).is_err() {
            return 0;
        }

        for &byte in buf[..count].iter() {
            // Cannot fail, count is at most N
            let _ = self.rx.push_back(byte);
        }
        count
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn max_buffer_size(&self) -> usize {
        N
    }

    fn supports_clock_change(&self) -> bool {
        false
    }
}
