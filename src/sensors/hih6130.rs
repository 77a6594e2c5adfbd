// Licensed under the Apache-2.0 license

//! HIH6130 humidity/temperature sensor.
//!
//! The device has no register map: an address-only write triggers a
//! measurement, and a four-byte read returns status, 14-bit humidity and
//! 14-bit temperature counts. Count-to-unit scaling is linear and done in
//! integer centi-units.

use crate::common::Logger;
use crate::config::HUMIDITY_SENSOR_ADDRESS;
use crate::i2c::common::Error;
use crate::i2c::engine::{ReadRequest, WriteRequest};
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;
use fugit::MillisDurationU32;

/// Wait between the measurement request and the data fetch.
pub const CONVERSION_DELAY: MillisDurationU32 = MillisDurationU32::from_ticks(100);

const COUNT_MASK: u16 = 0x3FFF;
const COUNT_SPAN: u32 = 0x3FFF;

/// Status bits of the first response byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeasurementStatus {
    /// Fresh data.
    Normal,
    /// Data already fetched once since the last conversion.
    Stale,
    /// Device is in command mode.
    CommandMode,
    Diagnostic,
}

impl MeasurementStatus {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => MeasurementStatus::Normal,
            1 => MeasurementStatus::Stale,
            2 => MeasurementStatus::CommandMode,
            _ => MeasurementStatus::Diagnostic,
        }
    }
}

/// One decoded measurement frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub status: MeasurementStatus,
    /// 14-bit raw humidity counts.
    pub humidity_counts: u16,
    /// 14-bit raw temperature counts.
    pub temperature_counts: u16,
}

impl Measurement {
    /// Relative humidity in hundredths of a percent (0..=10000).
    #[must_use]
    pub fn humidity_centi_percent(&self) -> u32 {
        u32::from(self.humidity_counts) * 10_000 / COUNT_SPAN
    }

    /// Temperature in hundredths of a degree Celsius (-4000..=12500).
    #[must_use]
    pub fn temperature_centi_celsius(&self) -> i32 {
        (u32::from(self.temperature_counts) * 16_500 / COUNT_SPAN) as i32 - 4_000
    }
}

pub struct Hih6130 {
    address: u8,
}

impl Default for Hih6130 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hih6130 {
    #[must_use]
    pub fn new() -> Self {
        Self::at_address(HUMIDITY_SENSOR_ADDRESS)
    }

    #[must_use]
    pub fn at_address(address: u8) -> Self {
        Self { address }
    }

    /// Trigger a conversion; wait [`CONVERSION_DELAY`] before fetching.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn request_measurement<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<MillisDurationU32, Error> {
        bus.execute_write(&WriteRequest::new(self.address, &[]))?;
        Ok(CONVERSION_DELAY)
    }

    /// Fetch and decode the four-byte measurement frame.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn read_measurement<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<Measurement, Error> {
        let request = ReadRequest::new(self.address, &[], 4);
        let bytes = bus.execute_read(&request)?;
        let hum_high = bytes.first().copied().ok_or(Error::ShortRead)?;
        let hum_low = bytes.get(1).copied().ok_or(Error::ShortRead)?;
        let temp_high = bytes.get(2).copied().ok_or(Error::ShortRead)?;
        let temp_low = bytes.get(3).copied().ok_or(Error::ShortRead)?;

        let humidity = ((u16::from(hum_high) << 8) | u16::from(hum_low)) & COUNT_MASK;
        let temperature = ((u16::from(temp_high) << 8) | u16::from(temp_low)) >> 2;

        Ok(Measurement {
            status: MeasurementStatus::from_bits(hum_high >> 6),
            humidity_counts: humidity,
            temperature_counts: temperature,
        })
    }
}
