//! One physical bus shared by several device handles
//!
//! The bus lives in a [`BusCell`], typically a `static` built with
//! `CriticalSectionRawMutex`. Each device handle gets its own
//! [`SharedBus`] reference; every bus call locks the cell for the
//! duration of that call only. Callers still serialize whole transfers
//! when they have preemptive tasks on the same bus.
//!
//! ```ignore
//! static I2C0: BusCell<CriticalSectionRawMutex, WireAdapter<I2c0>> = ...;
//!
//! let mut sensor = shared_device(0x48, &I2C0, EmbassyClock);
//! let mut eeprom = shared_device(0x50, &I2C0, EmbassyClock);
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use wirelink_core::I2cDevice;
use wirelink_hal::{BusPins, EndStatus, TwoWire};

/// Mutex-guarded bus storage
pub type BusCell<M, B> = Mutex<M, RefCell<B>>;

/// Handle to a bus owned by a [`BusCell`]
///
/// A shared bus never reports shutdown support: ending it would pull the
/// bus out from under every other device on it.
pub struct SharedBus<'a, M: RawMutex, B> {
    cell: &'a BusCell<M, B>,
}

impl<'a, M: RawMutex, B> SharedBus<'a, M, B> {
    /// Create a handle to the bus in `cell`
    pub fn new(cell: &'a BusCell<M, B>) -> Self {
        Self { cell }
    }

    fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.cell.lock(|bus| f(&mut *bus.borrow_mut()))
    }
}

impl<M: RawMutex, B> Clone for SharedBus<'_, M, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, B> Copy for SharedBus<'_, M, B> {}

impl<M: RawMutex, B: TwoWire> TwoWire for SharedBus<'_, M, B> {
    fn begin(&mut self, pins: Option<BusPins>) -> bool {
        self.with(|bus| bus.begin(pins))
    }

    fn end(&mut self) {}

    fn set_clock(&mut self, frequency: u32) {
        self.with(|bus| bus.set_clock(frequency))
    }

    fn begin_transaction(&mut self, address: u8) {
        self.with(|bus| bus.begin_transaction(address))
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        self.with(|bus| bus.write_bytes(data))
    }

    fn end_transaction(&mut self, send_stop: bool) -> EndStatus {
        self.with(|bus| bus.end_transaction(send_stop))
    }

    fn request_bytes(&mut self, address: u8, count: usize, send_stop: bool) -> usize {
        self.with(|bus| bus.request_bytes(address, count, send_stop))
    }

    fn available(&self) -> usize {
        self.with(|bus| bus.available())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.with(|bus| bus.read_byte())
    }

    fn max_buffer_size(&self) -> usize {
        self.with(|bus| bus.max_buffer_size())
    }

    fn supports_shutdown(&self) -> bool {
        false
    }

    fn supports_clock_change(&self) -> bool {
        self.with(|bus| bus.supports_clock_change())
    }
}

/// Create a device handle on a shared bus
pub fn shared_device<'a, M: RawMutex, B: TwoWire, C>(
    address: u8,
    cell: &'a BusCell<M, B>,
    clock: C,
) -> I2cDevice<SharedBus<'a, M, B>, C> {
    I2cDevice::new(address, SharedBus::new(cell), clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeI2c, Op};
    use crate::wire::WireAdapter;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use wirelink_core::TransferError;
    use wirelink_hal::Clock;

    struct TickClock(Cell<u32>);

    impl Clock for TickClock {
        fn now_ms(&self) -> u32 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    fn bus_with_two_peers() -> BusCell<NoopRawMutex, WireAdapter<FakeI2c>> {
        let mut i2c = FakeI2c::new(0x50);
        i2c.extra_peer = Some(0x48);
        for (i, byte) in i2c.memory.iter_mut().enumerate() {
            *byte = i as u8;
        }
        Mutex::new(RefCell::new(WireAdapter::new(i2c)))
    }

    #[test]
    fn test_two_devices_one_bus() {
        let cell = bus_with_two_peers();
        let mut eeprom = shared_device(0x50, &cell, TickClock(Cell::new(0)));
        let mut sensor = shared_device(0x48, &cell, TickClock(Cell::new(0)));

        eeprom.initialize().unwrap();
        sensor.initialize().unwrap();
        assert!(eeprom.is_connected());
        assert!(sensor.is_connected());

        sensor.write(&[0x01, 0x60], true).unwrap();

        let mut page = [0u8; 40];
        eeprom.write_then_read(&[0x10], &mut page, true).unwrap();
        assert_eq!(page[0], 0x10);
        assert_eq!(page[39], 0x10 + 39);

        cell.lock(|bus| {
            let bus = bus.borrow();
            let log = &bus.inner().log;
            assert_eq!(log[2], vec![Op::Write(0x48, vec![0x01, 0x60])]);
            assert_eq!(log[3], vec![Op::Write(0x50, vec![])]);
            // Register select rides along with the first segment
            assert_eq!(log[4], vec![Op::Write(0x50, vec![0x10]), Op::Read(0x50, 32)]);
            assert_eq!(log[5], vec![Op::Read(0x50, 8)]);
        });
    }

    #[test]
    fn test_shutdown_leaves_shared_bus_running() {
        let cell = bus_with_two_peers();
        let mut first = shared_device(0x50, &cell, TickClock(Cell::new(0)));
        let mut second = shared_device(0x48, &cell, TickClock(Cell::new(0)));
        first.initialize().unwrap();
        second.initialize().unwrap();

        assert!(!first.supports_shutdown());
        first.shutdown();

        assert!(first.is_started());
        assert!(second.is_connected());
    }

    #[test]
    fn test_clock_change_follows_inner_bus() {
        let cell = bus_with_two_peers();
        let mut device = shared_device(0x50, &cell, TickClock(Cell::new(0)));
        device.initialize().unwrap();

        assert_eq!(
            device.set_speed_clock(400_000),
            Err(TransferError::UnsupportedClockChange)
        );
        assert_eq!(device.max_buffer_size(), 32);
    }

    #[test]
    fn test_register_read_survives_failed_request() {
        let cell = bus_with_two_peers();
        cell.lock(|bus| bus.borrow_mut().inner_mut().fail_reads = 1);
        let mut device = shared_device(0x50, &cell, TickClock(Cell::new(0)));
        device.initialize().unwrap();

        let mut rx = [0u8; 2];
        device.write_then_read(&[0x40], &mut rx, true).unwrap();

        assert_eq!(rx, [0x40, 0x41]);
    }

    #[test]
    fn test_write_without_stop_to_absent_peer_fails() {
        let cell = bus_with_two_peers();
        let mut device = shared_device(0x11, &cell, TickClock(Cell::new(0)));
        device.initialize().unwrap();

        assert_eq!(
            device.write(&[0x01], false),
            Err(TransferError::TransactionEnd)
        );
        assert_eq!(
            device.write_then_read(&[0x01], &mut [0u8; 2], true),
            Err(TransferError::TransactionEnd)
        );
    }

    #[test]
    fn test_absent_peer_times_out() {
        let cell = bus_with_two_peers();
        let mut device = shared_device(0x20, &cell, TickClock(Cell::new(0)));
        device.initialize().unwrap();
        device.set_timeout(5);

        assert!(!device.is_connected());
        assert_eq!(
            device.read(&mut [0u8; 4], true),
            Err(TransferError::SegmentTimeout)
        );
    }
}
