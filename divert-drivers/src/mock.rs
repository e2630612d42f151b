//! Scripted I2C bus for driver tests

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use heapless::{Deque, Vec};

/// One recorded bus write: device address and payload
pub type Write = (u8, Vec<u8, 4>);

#[derive(Default)]
pub struct MockI2c {
    pub writes: Vec<Write, 64>,
    pub responses: Deque<u8, 32>,
    pub fail: bool,
}

impl MockI2c {
    pub fn respond(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.responses.push_back(b).unwrap();
        }
    }

    /// Payloads written to `addr`, in order
    pub fn payloads(&self, addr: u8) -> impl Iterator<Item = &[u8]> {
        self.writes
            .iter()
            .filter(move |(a, _)| *a == addr)
            .map(|(_, p)| p.as_slice())
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let payload = Vec::from_slice(bytes).unwrap();
                    self.writes.push((address, payload)).unwrap();
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.responses.pop_front().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}
