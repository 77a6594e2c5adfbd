// Licensed under the Apache-2.0 license

//! Bus transaction engine.
//!
//! Executes one atomic read or write transaction per call against an
//! [`I2cTransport`] and reports the outcome through the error taxonomy in
//! [`crate::i2c::common`]. Reads follow the two-phase register protocol
//! common to I2C sensors: a command phase that writes the register pointer
//! (own start/stop), then a data phase that pulls the requested byte count.
//!
//! The engine owns a single [`TransactionBuffer`] that stages outbound
//! payloads and receives inbound bytes. Transports may fill their receive
//! FIFO from interrupt context, so every buffer commit is bracketed by
//! `critical_section::with`; the closure scope guarantees the bracket is
//! released on every exit path.

use crate::config::{I2C_BUFFER_CAPACITY, I2C_RECEIVE_BUFFER_SIZE, I2C_SEND_BUFFER_SIZE};
use crate::i2c::common::{AckPolicy, Direction, Error};
use crate::i2c::traits::I2cTransport;

/// Staging area for the byte payload of the most recent transaction.
///
/// For writes, `data[..length]` holds the transmitted payload; for reads it
/// holds the received bytes. The previous transaction's content persists
/// until the next one overwrites it.
pub struct TransactionBuffer {
    data: [u8; I2C_BUFFER_CAPACITY],
    length: usize,
    peer_address: u8,
    valid: bool,
}

impl Default for TransactionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0; I2C_BUFFER_CAPACITY],
            length: 0,
            peer_address: 0,
            valid: false,
        }
    }

    /// Bytes of the most recent transaction, in bus order.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.data.get(..self.length).unwrap_or(&[])
    }

    /// Device address the content was sent to or received from.
    #[must_use]
    pub fn peer_address(&self) -> u8 {
        self.peer_address
    }

    /// True only if the most recent transaction completed fully.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Caller must have bounds-checked `bytes` against the capacity.
    fn commit(&mut self, peer: u8, bytes: &[u8], valid: bool) {
        self.peer_address = peer;
        self.length = bytes.len();
        self.valid = valid;
        if let Some(dst) = self.data.get_mut(..bytes.len()) {
            dst.copy_from_slice(bytes);
        }
    }

    fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Descriptor for a register read: command bytes select what to read, then
/// `read_length` bytes are pulled back. An empty `command` skips the command
/// phase entirely (pure read).
pub struct ReadRequest<'a> {
    pub target_address: u8,
    pub command: &'a [u8],
    pub read_length: usize,
}

impl<'a> ReadRequest<'a> {
    #[must_use]
    pub fn new(target_address: u8, command: &'a [u8], read_length: usize) -> Self {
        Self {
            target_address,
            command,
            read_length,
        }
    }
}

/// Descriptor for a write: `data` goes out verbatim. An empty `data` is an
/// address-only probe.
pub struct WriteRequest<'a> {
    pub target_address: u8,
    pub data: &'a [u8],
}

impl<'a> WriteRequest<'a> {
    #[must_use]
    pub fn new(target_address: u8, data: &'a [u8]) -> Self {
        Self {
            target_address,
            data,
        }
    }
}

/// A transaction in either direction, carrying only the fields that
/// direction needs.
pub enum Request<'a> {
    Read(ReadRequest<'a>),
    Write(WriteRequest<'a>),
}

/// Executes transactions serially over one transport instance.
///
/// Not reentrant: `&mut self` on every operation guarantees at most one
/// transaction in flight per bus.
pub struct TransactionEngine<T: I2cTransport> {
    transport: T,
    buffer: TransactionBuffer,
    last_error: Option<Error>,
    timeout_polls: u32,
}

impl<T: I2cTransport> TransactionEngine<T> {
    pub fn new(transport: T, timeout_polls: u32) -> Self {
        Self {
            transport,
            buffer: TransactionBuffer::new(),
            last_error: None,
            timeout_polls,
        }
    }

    /// The staging buffer of the most recent transaction.
    #[must_use]
    pub fn buffer(&self) -> &TransactionBuffer {
        &self.buffer
    }

    /// Error recorded by the most recent transaction; `None` after success.
    /// Overwritten on every transaction.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Direct access to the transport, for bus recovery paths.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport.
    #[must_use]
    pub fn release(self) -> T {
        self.transport
    }

    /// Execute either kind of transaction.
    ///
    /// # Errors
    ///
    /// See [`execute_read`](Self::execute_read) and
    /// [`execute_write`](Self::execute_write).
    pub fn execute(&mut self, request: &Request<'_>) -> Result<(), Error> {
        match request {
            Request::Read(read) => self.execute_read(read).map(|_| ()),
            Request::Write(write) => self.execute_write(write),
        }
    }

    /// Perform one write transaction: start, address+W, payload, stop.
    ///
    /// # Errors
    ///
    /// `BufferOverflow` before any bus traffic if the payload exceeds the
    /// send capacity; otherwise the mapped transport fault or `Timeout`.
    pub fn execute_write(&mut self, request: &WriteRequest<'_>) -> Result<(), Error> {
        let result = self.try_write(request);
        self.last_error = result.err();
        result
    }

    /// Perform one read transaction (command phase, then data phase) and
    /// return the number of bytes received into the buffer.
    ///
    /// The read is valid only if exactly `read_length` bytes arrive; a
    /// shortfall fails with `ShortRead` and leaves the buffer invalid.
    ///
    /// # Errors
    ///
    /// `BufferOverflow` before any bus traffic on oversize requests,
    /// `ShortRead` on a partial data phase, `Timeout` when the transport
    /// never became ready, or the mapped transport fault.
    pub fn execute_read(&mut self, request: &ReadRequest<'_>) -> Result<usize, Error> {
        let result = self.try_read(request);
        self.last_error = result.err();
        result
    }

    /// Address-only write probe: true if a device acknowledges `address`.
    pub fn check_presence(&mut self, address: u8) -> bool {
        self.execute_write(&WriteRequest::new(address, &[])).is_ok()
    }

    fn try_write(&mut self, request: &WriteRequest<'_>) -> Result<(), Error> {
        if request.data.len() > I2C_SEND_BUFFER_SIZE {
            return Err(Error::BufferOverflow);
        }

        critical_section::with(|_| {
            self.buffer
                .commit(request.target_address, request.data, false);
        });

        self.transport
            .start(request.target_address, Direction::Write)
            .map_err(Error::from)?;
        for &byte in request.data {
            if let Err(error) = self.poll_write(byte) {
                let _ = self.transport.stop();
                return Err(error);
            }
        }
        self.transport.stop().map_err(Error::from)?;

        critical_section::with(|_| {
            self.buffer.valid = true;
        });
        Ok(())
    }

    fn try_read(&mut self, request: &ReadRequest<'_>) -> Result<usize, Error> {
        if request.command.len() > I2C_SEND_BUFFER_SIZE
            || request.read_length > I2C_RECEIVE_BUFFER_SIZE
        {
            return Err(Error::BufferOverflow);
        }

        critical_section::with(|_| self.buffer.invalidate());

        if !request.command.is_empty() {
            self.transport
                .start(request.target_address, Direction::Write)
                .map_err(Error::from)?;
            for &byte in request.command {
                if let Err(error) = self.poll_write(byte) {
                    let _ = self.transport.stop();
                    return Err(error);
                }
            }
            self.transport.stop().map_err(Error::from)?;
        }

        self.transport
            .start(request.target_address, Direction::Read)
            .map_err(Error::from)?;

        let mut scratch = [0u8; I2C_BUFFER_CAPACITY];
        let mut received = 0usize;
        for index in 0..request.read_length {
            let ack = if index + 1 == request.read_length {
                AckPolicy::Nack
            } else {
                AckPolicy::Ack
            };
            match self.poll_read(ack) {
                Ok(byte) => {
                    if let Some(slot) = scratch.get_mut(index) {
                        *slot = byte;
                    }
                    received += 1;
                }
                Err(error) => {
                    let _ = self.transport.stop();
                    let partial = scratch.get(..received).unwrap_or(&[]);
                    critical_section::with(|_| {
                        self.buffer.commit(request.target_address, partial, false);
                    });
                    // Any shortfall after the first byte is a short read;
                    // a wait that never produced data keeps its own kind.
                    return Err(if received > 0 { Error::ShortRead } else { error });
                }
            }
        }

        let stop_result = self.transport.stop().map_err(Error::from);
        let complete = stop_result.is_ok();
        let bytes = scratch.get(..received).unwrap_or(&[]);
        critical_section::with(|_| {
            self.buffer.commit(request.target_address, bytes, complete);
        });
        stop_result?;
        Ok(received)
    }

    fn poll_write(&mut self, byte: u8) -> Result<(), Error> {
        let mut budget = self.timeout_polls;
        loop {
            match self.transport.write_byte(byte) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(fault)) => return Err(Error::from(fault)),
                Err(nb::Error::WouldBlock) => {
                    if budget == 0 {
                        return Err(Error::Timeout);
                    }
                    budget -= 1;
                }
            }
        }
    }

    fn poll_read(&mut self, ack: AckPolicy) -> Result<u8, Error> {
        let mut budget = self.timeout_polls;
        loop {
            match self.transport.read_byte(ack) {
                Ok(byte) => return Ok(byte),
                Err(nb::Error::Other(fault)) => return Err(Error::from(fault)),
                Err(nb::Error::WouldBlock) => {
                    if budget == 0 {
                        return Err(Error::Timeout);
                    }
                    budget -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::MockTransport;

    fn engine(transport: MockTransport) -> TransactionEngine<MockTransport> {
        TransactionEngine::new(transport, 16)
    }

    #[test]
    fn write_transmits_bytes_in_order() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);

        let request = WriteRequest::new(0x50, &[0x10, 0xAA, 0xBB]);
        assert!(engine.execute_write(&request).is_ok());

        let transport = engine.release();
        assert_eq!(transport.writes, vec![(0x50, vec![0x10, 0xAA, 0xBB])]);
    }

    #[test]
    fn write_success_marks_buffer_valid() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);

        let request = WriteRequest::new(0x50, &[0x01, 0x02]);
        assert!(engine.execute_write(&request).is_ok());
        assert!(engine.buffer().is_valid());
        assert_eq!(engine.buffer().peer_address(), 0x50);
        assert_eq!(engine.buffer().bytes(), &[0x01, 0x02]);
        assert_eq!(engine.last_error(), None);
    }

    #[test]
    fn address_nack_fails_write_and_buffer_stays_invalid() {
        let mut engine = engine(MockTransport::new());
        // no device at 0x41

        let request = WriteRequest::new(0x41, &[0x00]);
        assert_eq!(engine.execute_write(&request), Err(Error::AddressNack));
        assert!(!engine.buffer().is_valid());
        assert_eq!(engine.last_error(), Some(Error::AddressNack));
    }

    #[test]
    fn data_nack_is_classified() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);
        engine.transport_mut().nack_data_after = Some(1);

        let request = WriteRequest::new(0x50, &[0x10, 0x20, 0x30]);
        assert_eq!(engine.execute_write(&request), Err(Error::DataNack));
        assert!(!engine.buffer().is_valid());
    }

    #[test]
    fn oversize_write_fails_without_bus_traffic() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);

        let payload = [0u8; I2C_SEND_BUFFER_SIZE + 1];
        let request = WriteRequest::new(0x50, &payload);
        assert_eq!(engine.execute_write(&request), Err(Error::BufferOverflow));
        assert_eq!(engine.release().starts, 0);
    }

    #[test]
    fn oversize_read_fails_without_bus_traffic() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);

        let request = ReadRequest::new(0x50, &[0x00], I2C_RECEIVE_BUFFER_SIZE + 1);
        assert_eq!(engine.execute_read(&request), Err(Error::BufferOverflow));
        assert_eq!(engine.release().starts, 0);
    }

    #[test]
    fn two_phase_read_selects_register_then_pulls_bytes() {
        let mut transport = MockTransport::new();
        transport.add_device(0x68, 1);
        transport.set_register(0x68, 0x02, 0x12);
        transport.set_register(0x68, 0x03, 0x34);
        let mut engine = engine(transport);

        let command = [0x02];
        let request = ReadRequest::new(0x68, &command, 2);
        assert_eq!(engine.execute_read(&request), Ok(2));
        assert!(engine.buffer().is_valid());
        assert_eq!(engine.buffer().bytes(), &[0x12, 0x34]);
        assert_eq!(engine.buffer().peer_address(), 0x68);
    }

    #[test]
    fn empty_command_skips_command_phase() {
        let mut transport = MockTransport::new();
        transport.add_device(0x27, 1);
        transport.set_frame(0x27, &[0x1A, 0x2B]);
        let mut engine = engine(transport);

        let request = ReadRequest::new(0x27, &[], 2);
        assert_eq!(engine.execute_read(&request), Ok(2));

        let transport = engine.release();
        // one start for the data phase only
        assert_eq!(transport.starts, 1);
    }

    #[test]
    fn short_read_is_total_failure() {
        let mut transport = MockTransport::new();
        transport.add_device(0x39, 1);
        transport.set_register(0x39, 0x00, 0x55);
        transport.read_limit = Some(1);
        let mut engine = engine(transport);

        let command = [0x00];
        let request = ReadRequest::new(0x39, &command, 4);
        assert_eq!(engine.execute_read(&request), Err(Error::ShortRead));
        assert!(!engine.buffer().is_valid());
        assert_eq!(engine.last_error(), Some(Error::ShortRead));
    }

    #[test]
    fn stalled_transport_times_out() {
        let mut transport = MockTransport::new();
        transport.add_device(0x39, 1);
        transport.stall_reads = true;
        let mut engine = engine(transport);

        let request = ReadRequest::new(0x39, &[], 1);
        assert_eq!(engine.execute_read(&request), Err(Error::Timeout));
        assert!(!engine.buffer().is_valid());
    }

    #[test]
    fn presence_probe_reports_ack() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x77, 1);

        assert!(engine.check_presence(0x77));
        assert!(!engine.check_presence(0x11));
    }

    #[test]
    fn tagged_request_dispatches_both_directions() {
        let mut transport = MockTransport::new();
        transport.add_device(0x50, 1);
        transport.set_register(0x50, 0x00, 0x7F);
        let mut engine = engine(transport);

        let command = [0x00];
        let read = Request::Read(ReadRequest::new(0x50, &command, 1));
        assert!(engine.execute(&read).is_ok());
        assert_eq!(engine.buffer().bytes(), &[0x7F]);

        let write = Request::Write(WriteRequest::new(0x50, &[0x00, 0x42]));
        assert!(engine.execute(&write).is_ok());
    }

    #[test]
    fn register_write_then_read_round_trips() {
        let mut engine = engine(MockTransport::new());
        engine.transport_mut().add_device(0x50, 1);

        let write = WriteRequest::new(0x50, &[0x1C, 0xA5]);
        assert!(engine.execute_write(&write).is_ok());

        let command = [0x1C];
        let read = ReadRequest::new(0x50, &command, 1);
        assert_eq!(engine.execute_read(&read), Ok(1));
        assert_eq!(engine.buffer().bytes(), &[0xA5]);
    }
}
