// Licensed under the Apache-2.0 license

//! High-level I2C controller for the sensor node.
//!
//! Wraps the transaction engine with configuration and failure logging, and
//! implements the embedded-hal `I2c` trait so the node's bus can be handed
//! to any embedded-hal 1.0 driver. Sensor drivers in this crate talk to the
//! controller through the request API and the typed register accessors.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{Error, I2cConfig};
use crate::i2c::engine::{ReadRequest, TransactionEngine, WriteRequest};
use crate::i2c::traits::I2cTransport;
use embedded_hal::i2c::{Operation, SevenBitAddress};

pub struct I2cController<T: I2cTransport, L: Logger = NoOpLogger> {
    pub engine: TransactionEngine<T>,
    pub config: I2cConfig,
    pub logger: L,
}

impl<T: I2cTransport> I2cController<T, NoOpLogger> {
    pub fn new(transport: T, config: I2cConfig) -> Self {
        Self::with_logger(transport, config, NoOpLogger {})
    }
}

impl<T: I2cTransport, L: Logger> I2cController<T, L> {
    pub fn with_logger(transport: T, config: I2cConfig, logger: L) -> Self {
        let engine = TransactionEngine::new(transport, config.timeout_polls);
        Self {
            engine,
            config,
            logger,
        }
    }

    /// Execute a write transaction, logging failures before propagating
    /// them unchanged.
    ///
    /// # Errors
    ///
    /// See [`TransactionEngine::execute_write`].
    pub fn execute_write(&mut self, request: &WriteRequest<'_>) -> Result<(), Error> {
        let result = self.engine.execute_write(request);
        if result.is_err() {
            self.logger.log("i2c: write transaction failed");
        }
        result
    }

    /// Execute a read transaction and return the received bytes.
    ///
    /// # Errors
    ///
    /// See [`TransactionEngine::execute_read`].
    pub fn execute_read(&mut self, request: &ReadRequest<'_>) -> Result<&[u8], Error> {
        if let Err(error) = self.engine.execute_read(request) {
            self.logger.log("i2c: read transaction failed");
            return Err(error);
        }
        Ok(self.engine.buffer().bytes())
    }

    /// True if a device acknowledges `address`.
    pub fn check_presence(&mut self, address: u8) -> bool {
        self.engine.check_presence(address)
    }

    /// Error recorded by the most recent transaction; `None` after success.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.engine.last_error()
    }
}

impl<T: I2cTransport, L: Logger> embedded_hal::i2c::ErrorType for I2cController<T, L> {
    type Error = Error;
}

impl<T: I2cTransport, L: Logger> embedded_hal::i2c::I2c for I2cController<T, L> {
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let request = ReadRequest::new(addr, &[], buffer.len());
        let bytes = self.execute_read(&request)?;
        if bytes.len() != buffer.len() {
            return Err(Error::ShortRead);
        }
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.execute_write(&WriteRequest::new(addr, bytes))
    }

    /// The command and data phases run as two stopped transactions, not a
    /// repeated start; devices on this node accept both framings.
    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        let request = ReadRequest::new(addr, bytes, buffer.len());
        let received = self.execute_read(&request)?;
        if received.len() != buffer.len() {
            return Err(Error::ShortRead);
        }
        buffer.copy_from_slice(received);
        Ok(())
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Read(buffer) => {
                    embedded_hal::i2c::I2c::read(self, addr, buffer)?;
                }
                Operation::Write(bytes) => {
                    embedded_hal::i2c::I2c::write(self, addr, bytes)?;
                }
            }
        }
        Ok(())
    }
}
