// Licensed under the Apache-2.0 license

//! AT24C32 buffer EEPROM (32 Kbit).
//!
//! Memory locations are addressed with two big-endian bytes ahead of the
//! payload. Writes must stay inside one 32-byte device page; a page write is
//! additionally bounded by the node's send buffer (two address bytes plus
//! payload), which caps a single transaction below the full device page.

use crate::common::Logger;
use crate::config::{EEPROM_ADDRESS, I2C_SEND_BUFFER_SIZE};
use crate::i2c::common::Error;
use crate::i2c::engine::{ReadRequest, WriteRequest};
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;

/// Device page size in bytes.
pub const PAGE_SIZE: usize = 32;

/// Total device capacity in bytes.
pub const CAPACITY: usize = 4096;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EepromError {
    Bus(Error),
    /// Access beyond the device capacity.
    OutOfRange,
    /// A write crossing a device page boundary would wrap inside the page.
    PageBoundary,
    /// Payload too long for one transaction.
    TooLong,
}

impl From<Error> for EepromError {
    fn from(error: Error) -> Self {
        EepromError::Bus(error)
    }
}

pub struct Eeprom {
    address: u8,
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl Eeprom {
    #[must_use]
    pub fn new() -> Self {
        Self::at_address(EEPROM_ADDRESS)
    }

    #[must_use]
    pub fn at_address(address: u8) -> Self {
        Self { address }
    }

    /// Check the device acknowledges its address. Also the way to poll for
    /// write-cycle completion: the part stays silent while programming.
    pub fn is_ready<T: I2cTransport, L: Logger>(&self, bus: &mut I2cController<T, L>) -> bool {
        bus.check_presence(self.address)
    }

    /// Read one byte from `location`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` beyond the device capacity, or a bus error.
    pub fn read_byte<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        location: u16,
    ) -> Result<u8, EepromError> {
        if usize::from(location) >= CAPACITY {
            return Err(EepromError::OutOfRange);
        }
        let command = location.to_be_bytes();
        let request = ReadRequest::new(self.address, &command, 1);
        let bytes = bus.execute_read(&request)?;
        bytes.first().copied().ok_or(EepromError::Bus(Error::ShortRead))
    }

    /// Sequential read starting at `location`, filling `buffer`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` beyond the device capacity, or a bus error (reads longer
    /// than the receive buffer fail with `BufferOverflow`).
    pub fn read_sequential<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        location: u16,
        buffer: &mut [u8],
    ) -> Result<(), EepromError> {
        if usize::from(location) + buffer.len() > CAPACITY {
            return Err(EepromError::OutOfRange);
        }
        let command = location.to_be_bytes();
        let request = ReadRequest::new(self.address, &command, buffer.len());
        let bytes = bus.execute_read(&request)?;
        if bytes.len() != buffer.len() {
            return Err(EepromError::Bus(Error::ShortRead));
        }
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    /// Write one byte to `location`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` beyond the device capacity, or a bus error.
    pub fn write_byte<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        location: u16,
        value: u8,
    ) -> Result<(), EepromError> {
        if usize::from(location) >= CAPACITY {
            return Err(EepromError::OutOfRange);
        }
        let [high, low] = location.to_be_bytes();
        let payload = [high, low, value];
        bus.execute_write(&WriteRequest::new(self.address, &payload))?;
        Ok(())
    }

    /// Write `data` starting at `location` within one device page.
    ///
    /// # Errors
    ///
    /// `TooLong` when the payload cannot fit one transaction, `PageBoundary`
    /// when the write would wrap within the device page, `OutOfRange` beyond
    /// the device capacity, or a bus error.
    pub fn write_page<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        location: u16,
        data: &[u8],
    ) -> Result<(), EepromError> {
        if data.len() > PAGE_SIZE || data.len() + 2 > I2C_SEND_BUFFER_SIZE {
            return Err(EepromError::TooLong);
        }
        if usize::from(location) + data.len() > CAPACITY {
            return Err(EepromError::OutOfRange);
        }
        if usize::from(location) % PAGE_SIZE + data.len() > PAGE_SIZE {
            return Err(EepromError::PageBoundary);
        }

        let mut payload: heapless::Vec<u8, { 2 + PAGE_SIZE }> = heapless::Vec::new();
        payload
            .extend_from_slice(&location.to_be_bytes())
            .map_err(|()| EepromError::TooLong)?;
        payload
            .extend_from_slice(data)
            .map_err(|()| EepromError::TooLong)?;
        bus.execute_write(&WriteRequest::new(self.address, &payload))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::I2cConfigBuilder;
    use crate::i2c::mock::MockTransport;
    use hex_literal::hex;

    fn bus_with_eeprom() -> I2cController<MockTransport> {
        let mut transport = MockTransport::new();
        transport.add_device(0x50, 2);
        I2cController::new(transport, I2cConfigBuilder::new().timeout_polls(16).build())
    }

    #[test]
    fn byte_write_frames_two_address_bytes() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        eeprom.write_byte(&mut bus, 0x0123, 0xA5).unwrap();
        let transport = bus.engine.release();
        assert_eq!(transport.writes, vec![(0x50, vec![0x01, 0x23, 0xA5])]);
    }

    #[test]
    fn byte_round_trip() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        eeprom.write_byte(&mut bus, 0x0040, 0x77).unwrap();
        assert_eq!(eeprom.read_byte(&mut bus, 0x0040), Ok(0x77));
    }

    #[test]
    fn page_write_and_sequential_read() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        let data = hex!("00112233445566778899aabbccddeeff");
        eeprom.write_page(&mut bus, 0x0100, &data).unwrap();

        let mut readback = [0u8; 16];
        eeprom
            .read_sequential(&mut bus, 0x0100, &mut readback)
            .unwrap();
        assert_eq!(readback, data);
    }

    #[test]
    fn page_boundary_is_rejected() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        // 0x0110 + 20 bytes would cross into the next 32-byte page
        let data = [0u8; 20];
        assert_eq!(
            eeprom.write_page(&mut bus, 0x0110, &data),
            Err(EepromError::PageBoundary)
        );
    }

    #[test]
    fn oversize_payload_is_rejected_before_the_bus() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        // a full device page does not fit the node's send buffer
        let data = [0u8; PAGE_SIZE];
        assert_eq!(
            eeprom.write_page(&mut bus, 0x0000, &data),
            Err(EepromError::TooLong)
        );
        assert_eq!(bus.engine.release().starts, 0);
    }

    #[test]
    fn capacity_bound_is_enforced() {
        let mut bus = bus_with_eeprom();
        let eeprom = Eeprom::new();

        assert_eq!(
            eeprom.read_byte(&mut bus, CAPACITY as u16),
            Err(EepromError::OutOfRange)
        );
        let mut buffer = [0u8; 8];
        assert_eq!(
            eeprom.read_sequential(&mut bus, (CAPACITY - 4) as u16, &mut buffer),
            Err(EepromError::OutOfRange)
        );
    }
}
