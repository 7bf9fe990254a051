//! Mock bus and simulated clock for unit tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use wirelink_hal::{BusPins, Clock, EndStatus, TwoWire, DEFAULT_BUFFER_SIZE};

/// Bus calls observed by the mock, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Begin(u8),
    Write(usize),
    End(bool),
    Request {
        address: u8,
        count: usize,
        send_stop: bool,
    },
}

/// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u32>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

/// Scriptable two-wire bus with a single peer
pub struct MockBus {
    /// Address the simulated peer answers to
    pub peer_address: u8,
    /// Bytes the peer hands out, consumed front to back
    pub peer_data: Vec<u8>,
    pub refuse_start: bool,
    pub shutdown_supported: bool,
    pub clock_change_supported: bool,
    pub cap: usize,
    /// Accept at most this many bytes per write
    pub write_limit: Option<usize>,
    /// Force the status returned when ending a transaction
    pub end_status: Option<EndStatus>,
    /// Requests that stage nothing before data shows up
    pub stage_after: usize,
    /// Stage at most this many bytes per request
    pub stage_limit: Option<usize>,
    /// Stage more bytes than requested
    pub extra_bytes: usize,
    pub never_stage: bool,
    /// Stop staging after this many successful requests
    pub stop_staging_after: Option<usize>,
    /// Report this many more available bytes than are actually staged
    pub phantom_available: usize,

    pub begun_with: Option<Option<BusPins>>,
    pub end_calls: usize,
    pub clock_hz: Option<u32>,
    pub written: Vec<u8>,
    pub events: Vec<BusEvent>,

    tx_address: Option<u8>,
    requests_seen: usize,
    staged_requests: usize,
    cursor: usize,
    rx: VecDeque<u8>,
}

impl MockBus {
    pub fn new(peer_address: u8) -> Self {
        Self {
            peer_address,
            peer_data: Vec::new(),
            refuse_start: false,
            shutdown_supported: true,
            clock_change_supported: true,
            cap: DEFAULT_BUFFER_SIZE,
            write_limit: None,
            end_status: None,
            stage_after: 0,
            stage_limit: None,
            extra_bytes: 0,
            never_stage: false,
            stop_staging_after: None,
            phantom_available: 0,
            begun_with: None,
            end_calls: 0,
            clock_hz: None,
            written: Vec::new(),
            events: Vec::new(),
            tx_address: None,
            requests_seen: 0,
            staged_requests: 0,
            cursor: 0,
            rx: VecDeque::new(),
        }
    }

    fn next_peer_byte(&mut self) -> u8 {
        let byte = self.peer_data.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;
        byte
    }
}

impl TwoWire for MockBus {
    fn begin(&mut self, pins: Option<BusPins>) -> bool {
        if self.refuse_start {
            return false;
        }
        self.begun_with = Some(pins);
        true
    }

    fn end(&mut self) {
        self.end_calls += 1;
    }

    fn set_clock(&mut self, frequency: u32) {
        self.clock_hz = Some(frequency);
    }

    fn begin_transaction(&mut self, address: u8) {
        self.events.push(BusEvent::Begin(address));
        self.tx_address = Some(address);
    }

    fn write_bytes(&mut self, data: &[u8]) -> usize {
        self.events.push(BusEvent::Write(data.len()));
        let accepted = self.write_limit.map_or(data.len(), |limit| data.len().min(limit));
        self.written.extend_from_slice(&data[..accepted]);
        accepted
    }

    fn end_transaction(&mut self, send_stop: bool) -> EndStatus {
        self.events.push(BusEvent::End(send_stop));
        let address = self.tx_address.take();
        if let Some(status) = self.end_status {
            return status;
        }
        if address == Some(self.peer_address) {
            EndStatus::Success
        } else {
            EndStatus::AddressNack
        }
    }

    fn request_bytes(&mut self, address: u8, count: usize, send_stop: bool) -> usize {
        self.events.push(BusEvent::Request {
            address,
            count,
            send_stop,
        });
        self.rx.clear();
        self.requests_seen += 1;

        let exhausted = self
            .stop_staging_after
            .is_some_and(|limit| self.staged_requests >= limit);
        if self.never_stage
            || exhausted
            || address != self.peer_address
            || self.requests_seen <= self.stage_after
        {
            return 0;
        }

        let staged = self.stage_limit.map_or(count, |limit| count.min(limit)) + self.extra_bytes;
        for _ in 0..staged {
            let byte = self.next_peer_byte();
            self.rx.push_back(byte);
        }
        self.staged_requests += 1;
        staged
    }

    fn available(&self) -> usize {
        if self.rx.is_empty() {
            0
        } else {
            self.rx.len() + self.phantom_available
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn max_buffer_size(&self) -> usize {
        self.cap
    }

    fn supports_shutdown(&self) -> bool {
        self.shutdown_supported
    }

    fn supports_clock_change(&self) -> bool {
        self.clock_change_supported
    }
}
