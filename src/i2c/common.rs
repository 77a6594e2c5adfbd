// Licensed under the Apache-2.0 license

//! Common types and constants for the I2C driver modules.
//!
//! This module provides shared definitions for transfer direction, error
//! handling and driver configuration used across the I2C stack.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Data direction of the R/W bit in the I2C address header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Read,
    Write,
}

/// Acknowledge policy for a master read: ACK requests another byte, NACK
/// closes the transfer after the current one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AckPolicy {
    Ack,
    Nack,
}

/// Fault reported by the physical bus transport.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// No acknowledge on the address header.
    AddressNack,
    /// No acknowledge on a data byte.
    DataNack,
    /// Lost arbitration against another master.
    ArbitrationLost,
    /// Unclassified bus fault.
    Bus,
}

/// Transaction-level error taxonomy.
///
/// `ShortRead` means fewer bytes arrived than requested; it is a total
/// failure, never a partial success. `Timeout` means a bounded wait on the
/// transport expired before any byte moved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Error {
    AddressNack,
    DataNack,
    BufferOverflow,
    Timeout,
    ShortRead,
    Bus,
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::AddressNack => Error::AddressNack,
            Fault::DataNack => Error::DataNack,
            Fault::ArbitrationLost | Fault::Bus => Error::Bus,
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::BufferOverflow => ErrorKind::Overrun,
            Error::Timeout | Error::ShortRead | Error::Bus => ErrorKind::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

/// Default per-byte poll budget; sized for a 100 kHz bus with generous slack.
pub const DEFAULT_TIMEOUT_POLLS: u32 = 1_000;

pub struct I2cConfig {
    pub speed: I2cSpeed,
    /// Upper bound on transport polls per byte before the transaction fails
    /// with [`Error::Timeout`].
    pub timeout_polls: u32,
}

pub struct I2cConfigBuilder {
    speed: I2cSpeed,
    timeout_polls: u32,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            speed: I2cSpeed::Standard,
            timeout_polls: DEFAULT_TIMEOUT_POLLS,
        }
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn timeout_polls(mut self, polls: u32) -> Self {
        self.timeout_polls = polls;
        self
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            speed: self.speed,
            timeout_polls: self.timeout_polls,
        }
    }
}
