// Licensed under the Apache-2.0 license

//! DS1307 real-time clock.
//!
//! Timekeeping registers are BCD-coded; register 0x00 doubles as the
//! oscillator control through its CH bit, so halting and resuming the clock
//! is a read-modify-write of the seconds register that must not disturb the
//! stored seconds. The part also carries 56 bytes of battery-backed NVRAM
//! behind the clock registers. Calendar plausibility (leap years, month
//! lengths) is not validated here.

use crate::common::Logger;
use crate::config::RTC_ADDRESS;
use crate::i2c::common::Error;
use crate::i2c::engine::{ReadRequest, WriteRequest};
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;

const REG_SECONDS: u8 = 0x00;
const REG_CONTROL: u8 = 0x07;
const NVRAM_START: u8 = 0x08;

/// Battery-backed NVRAM bytes available behind the clock registers.
pub const NVRAM_SIZE: usize = 56;

const CLOCK_HALT: u8 = 0x80;

/// Broken-down time as the device stores it. `year` counts from 2000.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    /// 1..=7, device-defined week start.
    pub day_of_week: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

/// Square-wave output configuration on the SQW/OUT pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SquareWave {
    Disabled,
    Hz1,
    Hz4096,
    Hz8192,
    Hz32768,
}

impl SquareWave {
    fn bits(self) -> u8 {
        match self {
            SquareWave::Disabled => 0x00,
            SquareWave::Hz1 => 0x10,
            SquareWave::Hz4096 => 0x11,
            SquareWave::Hz8192 => 0x12,
            SquareWave::Hz32768 => 0x13,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ds1307Error {
    Bus(Error),
    /// NVRAM access beyond the 56-byte window.
    NvramRange,
}

impl From<Error> for Ds1307Error {
    fn from(error: Error) -> Self {
        Ds1307Error::Bus(error)
    }
}

/// Pack a binary value 0..=99 as BCD.
#[must_use]
pub fn dec_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Unpack a BCD byte to binary.
#[must_use]
pub fn bcd_to_dec(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

pub struct Ds1307 {
    address: u8,
}

impl Default for Ds1307 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds1307 {
    #[must_use]
    pub fn new() -> Self {
        Self::at_address(RTC_ADDRESS)
    }

    #[must_use]
    pub fn at_address(address: u8) -> Self {
        Self { address }
    }

    /// Check the device acknowledges its address.
    ///
    /// # Errors
    ///
    /// The probe's error when absent.
    pub fn begin<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Error> {
        if bus.check_presence(self.address) {
            Ok(())
        } else {
            Err(bus.last_error().unwrap_or(Error::AddressNack))
        }
    }

    /// Burst-read the seven timekeeping registers.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn datetime<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<DateTime, Ds1307Error> {
        let command = [REG_SECONDS];
        let request = ReadRequest::new(self.address, &command, 7);
        let bytes = bus.execute_read(&request)?;

        let field = |index: usize, mask: u8| -> Result<u8, Error> {
            bytes
                .get(index)
                .copied()
                .map(|raw| bcd_to_dec(raw & mask))
                .ok_or(Error::ShortRead)
        };

        Ok(DateTime {
            second: field(0, 0x7F)?,
            minute: field(1, 0x7F)?,
            hour: field(2, 0x3F)?,
            day_of_week: field(3, 0x07)?,
            day: field(4, 0x3F)?,
            month: field(5, 0x1F)?,
            year: field(6, 0xFF)?,
        })
    }

    /// Burst-write the seven timekeeping registers. Clears the CH bit, so
    /// the oscillator runs after a set.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn set_datetime<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        datetime: &DateTime,
    ) -> Result<(), Ds1307Error> {
        let payload = [
            REG_SECONDS,
            dec_to_bcd(datetime.second) & !CLOCK_HALT,
            dec_to_bcd(datetime.minute),
            dec_to_bcd(datetime.hour),
            dec_to_bcd(datetime.day_of_week),
            dec_to_bcd(datetime.day),
            dec_to_bcd(datetime.month),
            dec_to_bcd(datetime.year),
        ];
        bus.execute_write(&WriteRequest::new(self.address, &payload))?;
        Ok(())
    }

    /// True if the oscillator is running (CH bit clear).
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn is_running<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<bool, Error> {
        let seconds = bus.read_register(self.address, REG_SECONDS)?;
        Ok(seconds & CLOCK_HALT == 0)
    }

    /// Stop the oscillator, preserving the stored seconds.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn halt_clock<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Error> {
        let seconds = bus.read_register(self.address, REG_SECONDS)?;
        bus.write_register(self.address, REG_SECONDS, seconds | CLOCK_HALT)
    }

    /// Restart the oscillator, preserving the stored seconds.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn resume_clock<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Error> {
        let seconds = bus.read_register(self.address, REG_SECONDS)?;
        bus.write_register(self.address, REG_SECONDS, seconds & !CLOCK_HALT)
    }

    /// Configure the SQW/OUT pin.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn set_square_wave<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        output: SquareWave,
    ) -> Result<(), Error> {
        bus.write_register(self.address, REG_CONTROL, output.bits())
    }

    /// Read from the battery-backed NVRAM window.
    ///
    /// # Errors
    ///
    /// `NvramRange` if `offset + buffer` exceeds the 56-byte window, or a
    /// bus error.
    pub fn read_nvram<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        offset: u8,
        buffer: &mut [u8],
    ) -> Result<(), Ds1307Error> {
        if usize::from(offset) + buffer.len() > NVRAM_SIZE {
            return Err(Ds1307Error::NvramRange);
        }
        let command = [NVRAM_START + offset];
        let request = ReadRequest::new(self.address, &command, buffer.len());
        let bytes = bus.execute_read(&request)?;
        if bytes.len() != buffer.len() {
            return Err(Ds1307Error::Bus(Error::ShortRead));
        }
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    /// Write into the battery-backed NVRAM window.
    ///
    /// # Errors
    ///
    /// `NvramRange` if `offset + data` exceeds the 56-byte window, or a bus
    /// error.
    pub fn write_nvram<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        offset: u8,
        data: &[u8],
    ) -> Result<(), Ds1307Error> {
        if usize::from(offset) + data.len() > NVRAM_SIZE {
            return Err(Ds1307Error::NvramRange);
        }
        let mut payload: heapless::Vec<u8, { 1 + NVRAM_SIZE }> = heapless::Vec::new();
        payload
            .push(NVRAM_START + offset)
            .map_err(|_| Ds1307Error::Bus(Error::BufferOverflow))?;
        payload
            .extend_from_slice(data)
            .map_err(|_| Ds1307Error::Bus(Error::BufferOverflow))?;
        bus.execute_write(&WriteRequest::new(self.address, &payload))?;
        Ok(())
    }
}
