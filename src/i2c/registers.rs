// Licensed under the Apache-2.0 license

//! Typed register accessors.
//!
//! Helpers layered on the transaction engine for the one-command-byte
//! register convention every device on the node follows. Reads assemble
//! 16-bit values big-endian; 16-bit writes transmit the low byte first.
//! The asymmetry is deliberate and matches what the devices expect: the
//! calibration readers downstream depend on it byte-for-byte.

use crate::common::Logger;
use crate::i2c::common::Error;
use crate::i2c::engine::{ReadRequest, WriteRequest};
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;

impl<T: I2cTransport, L: Logger> I2cController<T, L> {
    /// Read one byte from `register` of the device at `device`.
    ///
    /// # Errors
    ///
    /// Propagates the engine error unchanged; no value escapes on failure.
    pub fn read_register(&mut self, device: u8, register: u8) -> Result<u8, Error> {
        let command = [register];
        let request = ReadRequest::new(device, &command, 1);
        let bytes = self.execute_read(&request)?;
        bytes.first().copied().ok_or(Error::ShortRead)
    }

    /// Read a 16-bit value, assembled big-endian: `(bytes[0] << 8) | bytes[1]`.
    ///
    /// # Errors
    ///
    /// Propagates the engine error unchanged.
    pub fn read_register_u16(&mut self, device: u8, register: u8) -> Result<u16, Error> {
        let command = [register];
        let request = ReadRequest::new(device, &command, 2);
        let bytes = self.execute_read(&request)?;
        let high = bytes.first().copied().ok_or(Error::ShortRead)?;
        let low = bytes.get(1).copied().ok_or(Error::ShortRead)?;
        Ok((u16::from(high) << 8) | u16::from(low))
    }

    /// Read a 16-bit value and reinterpret it as two's-complement signed.
    ///
    /// The full 16-bit pattern is taken as-is; there is no sign extension
    /// from a narrower field.
    ///
    /// # Errors
    ///
    /// Propagates the engine error unchanged.
    pub fn read_register_i16(&mut self, device: u8, register: u8) -> Result<i16, Error> {
        self.read_register_u16(device, register)
            .map(|value| value as i16)
    }

    /// Write one byte to `register`.
    ///
    /// # Errors
    ///
    /// Propagates the engine error unchanged.
    pub fn write_register(&mut self, device: u8, register: u8, value: u8) -> Result<(), Error> {
        let payload = [register, value];
        self.execute_write(&WriteRequest::new(device, &payload))
    }

    /// Write a 16-bit value, low byte first.
    ///
    /// # Errors
    ///
    /// Propagates the engine error unchanged.
    pub fn write_register_u16(&mut self, device: u8, register: u8, value: u16) -> Result<(), Error> {
        let payload = [register, (value & 0xFF) as u8, (value >> 8) as u8];
        self.execute_write(&WriteRequest::new(device, &payload))
    }
}
