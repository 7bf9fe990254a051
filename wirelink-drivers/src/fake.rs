//! Fake `embedded-hal` I2C bus for unit tests
//!
//! Simulates a register-file peer: the first written byte sets the
//! register pointer, reads return memory from the pointer onward.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// One operation inside a logged transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

pub struct FakeI2c {
    pub address: u8,
    /// Second peer that acknowledges but holds no data
    pub extra_peer: Option<u8>,
    pub memory: [u8; 256],
    /// Fail this many upcoming transactions that contain a read
    pub fail_reads: usize,
    /// Completed transactions, in order
    pub log: Vec<Vec<Op>>,
    pointer: u8,
}

impl FakeI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            extra_peer: None,
            memory: [0; 256],
            fail_reads: 0,
            log: Vec::new(),
            pointer: 0,
        }
    }

    fn acknowledges(&self, address: u8) -> bool {
        address == self.address || Some(address) == self.extra_peer
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let reads = operations.iter().any(|op| matches!(op, Operation::Read(_)));
        if reads && self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(ErrorKind::ArbitrationLoss);
        }
        if !self.acknowledges(address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut entry = Vec::new();
        let mut first_write = true;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(data) => {
                    if first_write {
                        if let Some(&reg) = data.first() {
                            self.pointer = reg;
                        }
                        first_write = false;
                    }
                    entry.push(Op::Write(address, data.to_vec()));
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = if address == self.address {
                            self.memory[self.pointer as usize]
                        } else {
                            0
                        };
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                    entry.push(Op::Read(address, buf.len()));
                }
            }
        }
        self.log.push(entry);
        Ok(())
    }
}
