// Licensed under the Apache-2.0 license

//! Physical-bus transport abstraction.
//!
//! The transaction engine drives the bus exclusively through [`I2cTransport`].
//! Implementations own the electrical layer (bit timing, start/stop
//! generation, ACK sampling); the engine owns framing, buffering and error
//! classification. Byte transfer primitives are `nb`-style so the engine can
//! bound every wait instead of spinning forever on a stuck bus.

use crate::i2c::common::{AckPolicy, Direction, Fault};

/// One physical I2C (TWI) bus.
///
/// A transaction is a `start`, one address header (carried by `start`), a
/// sequence of byte transfers, and a `stop`. The transport reports faults as
/// they occur; it keeps no transaction state beyond the current transfer.
pub trait I2cTransport {
    /// Generate a start (or repeated start) condition and transmit the
    /// address header for `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::AddressNack`] if no device acknowledges the header,
    /// or another fault for arbitration/bus failures.
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), Fault>;

    /// Transmit one byte to the addressed device.
    ///
    /// # Errors
    ///
    /// `nb::Error::WouldBlock` while the byte has not been accepted yet;
    /// [`Fault::DataNack`] if the device refuses it.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Fault>;

    /// Receive one byte from the addressed device, acknowledging per `ack`.
    ///
    /// # Errors
    ///
    /// `nb::Error::WouldBlock` while no byte is available yet.
    fn read_byte(&mut self, ack: AckPolicy) -> nb::Result<u8, Fault>;

    /// Generate a stop condition and release the bus.
    ///
    /// # Errors
    ///
    /// Returns a fault if the stop condition cannot be generated.
    fn stop(&mut self) -> Result<(), Fault>;

    /// Fault recorded by the most recent primitive, if any.
    fn last_fault(&self) -> Option<Fault>;
}
