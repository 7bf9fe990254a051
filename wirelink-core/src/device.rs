//! Device handle and chunked transfer engine
//!
//! An [`I2cDevice`] identifies one peer on a shared two-wire bus and
//! moves byte payloads of any length to and from it.
//!
//! # Reads
//!
//! Reads are split into segments no larger than the bus staging buffer
//! (see [`SegmentPlan`]). Each segment is fetched by re-issuing the bus
//! request until data is staged or the timeout expires; some
//! controllers only stage fresh data when the request itself is
//! repeated, so polling `available()` alone is not enough.
//!
//! ```text
//! IDLE ─► REQUESTING ──┬─► TIMED_OUT ──────────────► FAILURE
//!            ▲  │      │
//!            └──┘      └─► DATA_READY ─┬─► mismatch ─► FAILURE
//!          (yield)                     └─► DRAINING ─► SUCCESS
//! ```
//!
//! # Writes
//!
//! Writes are issued as a single transaction. Every failure path still
//! ends the transaction so the bus is never left held.

use wirelink_hal::{BusPins, Clock, I2cConfig, NoYield, TwoWire, YieldPoint};

use crate::config::{ConfigError, DeviceConfig, DEFAULT_TIMEOUT_MS};
use crate::error::TransferError;
use crate::segment::SegmentPlan;

/// Handle for one addressable peer on the bus
///
/// The handle owns its view of the bus (`B`), a millisecond clock (`C`)
/// and the yield hook run between polls (`Y`). To put several handles
/// on one physical bus, give each a shared bus reference such as
/// `wirelink_drivers::SharedBus`.
pub struct I2cDevice<B, C, Y = NoYield> {
    bus: B,
    clock: C,
    yield_point: Y,
    address: u8,
    pins: Option<BusPins>,
    started: bool,
    timeout_ms: u32,
    default_timeout_ms: u32,
    speed: Option<I2cConfig>,
}

impl<B, C> I2cDevice<B, C, NoYield> {
    /// Create a handle for the peer at `address`
    ///
    /// The handle is not usable until [`I2cDevice::initialize`] succeeds.
    pub fn new(address: u8, bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            yield_point: NoYield,
            address,
            pins: None,
            started: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            speed: None,
        }
    }

    /// Create a handle that routes the bus to specific pins on start
    pub fn with_pins(address: u8, pins: BusPins, bus: B, clock: C) -> Self {
        let mut device = Self::new(address, bus, clock);
        device.pins = Some(pins);
        device
    }

    /// Create a handle from a validated configuration
    pub fn from_config(config: &DeviceConfig, bus: B, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut device = Self::new(config.address, bus, clock);
        device.pins = config.pins;
        device.timeout_ms = config.timeout_ms;
        device.default_timeout_ms = config.timeout_ms;
        device.speed = config.i2c;
        Ok(device)
    }
}

impl<B, C, Y> I2cDevice<B, C, Y> {
    /// Replace the hook run between polling attempts
    pub fn with_yield<Y2>(self, yield_point: Y2) -> I2cDevice<B, C, Y2> {
        I2cDevice {
            bus: self.bus,
            clock: self.clock,
            yield_point,
            address: self.address,
            pins: self.pins,
            started: self.started,
            timeout_ms: self.timeout_ms,
            default_timeout_ms: self.default_timeout_ms,
            speed: self.speed,
        }
    }

    /// Configured 7-bit address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Configured pin routing, if any
    pub fn pins(&self) -> Option<BusPins> {
        self.pins
    }

    /// Check whether `initialize()` has succeeded
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Per-segment read timeout in milliseconds
    pub fn timeout(&self) -> u32 {
        self.timeout_ms
    }

    /// Set the per-segment read timeout in milliseconds
    ///
    /// `initialize()` resets this to the configured default.
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    /// Swap the underlying bus, returning the previous one
    ///
    /// The started flag is kept; call `initialize()` again if the new
    /// bus has not been started.
    pub fn set_bus(&mut self, bus: B) -> B {
        core::mem::replace(&mut self.bus, bus)
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the handle, returning the bus
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B, C, Y> I2cDevice<B, C, Y>
where
    B: TwoWire,
    C: Clock,
    Y: YieldPoint,
{
    /// Start the bus and mark the handle usable
    ///
    /// On success the read timeout is reset to the configured default
    /// and any configured bus speed is requested. A bus that cannot
    /// change its clock is not an initialization failure.
    pub fn initialize(&mut self) -> Result<(), TransferError> {
        if !self.bus.begin(self.pins) {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c {=u8:#x}: bus refused to start", self.address);
            return Err(TransferError::BusRefusedStart);
        }

        self.started = true;
        self.timeout_ms = self.default_timeout_ms;

        if let Some(speed) = self.speed {
            if self.set_speed(speed).is_err() {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "i2c {=u8:#x}: keeping default clock, {} Hz not supported",
                    self.address,
                    speed.frequency
                );
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("i2c {=u8:#x}: started", self.address);
        Ok(())
    }

    /// Release the bus where the platform allows it
    ///
    /// If the bus reports that it cannot be shut down (it is shared
    /// process-wide), this does nothing and the handle stays started.
    pub fn shutdown(&mut self) {
        if !self.bus.supports_shutdown() {
            #[cfg(feature = "defmt")]
            defmt::debug!("i2c {=u8:#x}: bus has no shutdown, left running", self.address);
            return;
        }

        self.bus.end();
        self.started = false;
    }

    /// Whether `shutdown()` actually releases the bus
    pub fn supports_shutdown(&self) -> bool {
        self.bus.supports_shutdown()
    }

    /// Whether `set_speed_clock()` can take effect
    pub fn supports_clock_change(&self) -> bool {
        self.bus.supports_clock_change()
    }

    /// Largest segment the bus can carry in one transaction
    pub fn max_buffer_size(&self) -> usize {
        self.bus.max_buffer_size()
    }

    /// Probe whether the peer acknowledges its address
    ///
    /// Sends an empty write. Returns `false` without touching the bus
    /// if the handle has not been started.
    pub fn is_connected(&mut self) -> bool {
        if !self.started {
            return false;
        }

        self.bus.begin_transaction(self.address);
        self.bus.end_transaction(true).is_success()
    }

    /// Change the bus clock frequency in Hz
    pub fn set_speed_clock(&mut self, frequency: u32) -> Result<(), TransferError> {
        if !self.bus.supports_clock_change() {
            return Err(TransferError::UnsupportedClockChange);
        }

        self.bus.set_clock(frequency);
        Ok(())
    }

    /// Apply a bus speed preset such as [`I2cConfig::FAST`]
    pub fn set_speed(&mut self, config: I2cConfig) -> Result<(), TransferError> {
        self.set_speed_clock(config.frequency)
    }

    /// Write `data` to the peer in a single transaction
    ///
    /// With `send_stop == false` the bus is held on success so a
    /// following read can use a repeated start. A short write always
    /// ends with a stop, whatever `send_stop` asked for.
    pub fn write(&mut self, data: &[u8], send_stop: bool) -> Result<(), TransferError> {
        self.ensure_started()?;

        self.bus.begin_transaction(self.address);

        let written = self.bus.write_bytes(data);
        if written != data.len() {
            // Release the bus before reporting
            let _status = self.bus.end_transaction(true);
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "i2c {=u8:#x}: short write, {} of {} bytes accepted",
                self.address,
                written,
                data.len()
            );
            return Err(TransferError::ShortWrite);
        }

        let status = self.bus.end_transaction(send_stop);
        if !status.is_success() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "i2c {=u8:#x}: end of transaction failed, status {}",
                self.address,
                status.code()
            );
            return Err(TransferError::TransactionEnd);
        }

        Ok(())
    }

    /// Fill `buffer` from the peer, splitting into bus-sized segments
    ///
    /// Only the final segment uses `send_stop`; earlier segments keep
    /// the bus open. The first failing segment aborts the read.
    pub fn read(&mut self, buffer: &mut [u8], send_stop: bool) -> Result<(), TransferError> {
        self.ensure_started()?;

        let cap = self.bus.max_buffer_size();
        let timeout_ms = self.timeout_ms;

        for segment in SegmentPlan::new(buffer.len(), cap, send_stop) {
            self.read_segment(&mut buffer[segment.range()], segment.send_stop, timeout_ms)?;
        }

        Ok(())
    }

    /// Write `tx` without releasing the bus, then read into `rx`
    ///
    /// This is the usual register access pattern: the peer sees a
    /// repeated start between the two halves.
    pub fn write_then_read(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        send_stop: bool,
    ) -> Result<(), TransferError> {
        self.write(tx, false)?;
        self.read(rx, send_stop)
    }

    /// Read exactly `buffer.len()` bytes in one bus request
    ///
    /// `buffer` must fit in [`I2cDevice::max_buffer_size`]. The request
    /// is repeated, yielding between attempts, until the bus stages
    /// data or `timeout_ms` elapses. A staged count other than exactly
    /// the requested length fails before `buffer` is touched. A bus that
    /// stops handing out bytes mid-drain also fails, but the bytes
    /// already drained stay in `buffer`.
    pub fn read_segment(
        &mut self,
        buffer: &mut [u8],
        send_stop: bool,
        timeout_ms: u32,
    ) -> Result<(), TransferError> {
        let len = buffer.len();
        if len == 0 {
            return Ok(());
        }

        let start = self.clock.now_ms();
        loop {
            self.bus.request_bytes(self.address, len, send_stop);
            self.yield_point.yield_now();

            if self.bus.available() != 0 || self.clock.elapsed_ms(start) >= timeout_ms {
                break;
            }
        }

        let received = self.bus.available();
        if received != len {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "i2c {=u8:#x}: expected {} bytes, received {}",
                self.address,
                len,
                received
            );
            return Err(if received == 0 {
                TransferError::SegmentTimeout
            } else {
                TransferError::SegmentLengthMismatch
            });
        }

        for slot in buffer.iter_mut() {
            *slot = self
                .bus
                .read_byte()
                .ok_or(TransferError::SegmentLengthMismatch)?;
        }

        Ok(())
    }

    fn ensure_started(&self) -> Result<(), TransferError> {
        if self.started {
            Ok(())
        } else {
            Err(TransferError::NotInitialized)
        }
    }
}
