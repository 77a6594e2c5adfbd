// Licensed under the Apache-2.0 license

//! TSL2561 ambient/infrared light sensor.
//!
//! Every register access goes through the device's command register, so the
//! command byte carries 0x80 plus the register address. The two data
//! channels are 16-bit words stored low byte first on the device; they are
//! assembled here explicitly rather than through the big-endian register
//! accessors.

use crate::common::Logger;
use crate::config::LIGHT_SENSOR_ADDRESS;
use crate::i2c::common::Error;
use crate::i2c::engine::ReadRequest;
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;
use fugit::MillisDurationU32;

const CMD: u8 = 0x80;
const REG_CONTROL: u8 = 0x00;
const REG_TIMING: u8 = 0x01;
const REG_ID: u8 = 0x0A;
const REG_DATA0_LOW: u8 = 0x0C;
const REG_DATA1_LOW: u8 = 0x0E;

const POWER_ON: u8 = 0x03;
const POWER_OFF: u8 = 0x00;
const GAIN_BIT: u8 = 0x10;
const INTEG_MASK: u8 = 0x03;

/// Analog gain setting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Gain {
    /// 1x
    Low,
    /// 16x
    High,
}

/// ADC integration window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegrationTime {
    Ms13,
    Ms101,
    Ms402,
    /// Integration is started and stopped manually.
    Manual,
}

impl IntegrationTime {
    fn bits(self) -> u8 {
        match self {
            IntegrationTime::Ms13 => 0,
            IntegrationTime::Ms101 => 1,
            IntegrationTime::Ms402 => 2,
            IntegrationTime::Manual => 3,
        }
    }

    /// Wall-clock wait before channel data is fresh; `None` for manual
    /// integration.
    #[must_use]
    pub fn period(self) -> Option<MillisDurationU32> {
        let ms = match self {
            IntegrationTime::Ms13 => 14,
            IntegrationTime::Ms101 => 101,
            IntegrationTime::Ms402 => 402,
            IntegrationTime::Manual => return None,
        };
        Some(MillisDurationU32::from_ticks(ms))
    }
}

pub struct Tsl2561 {
    address: u8,
}

impl Default for Tsl2561 {
    fn default() -> Self {
        Self::new()
    }
}

impl Tsl2561 {
    #[must_use]
    pub fn new() -> Self {
        Self::at_address(LIGHT_SENSOR_ADDRESS)
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

    /// Power the device up and begin integrations.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn power_up<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Error> {
        bus.write_register(self.address, CMD | REG_CONTROL, POWER_ON)
    }

    /// Power the device down.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn power_down<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Error> {
        bus.write_register(self.address, CMD | REG_CONTROL, POWER_OFF)
    }

    /// Configure gain and integration window, preserving the other timing
    /// bits, and return the integration period to wait before reading.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn set_timing<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        gain: Gain,
        integration: IntegrationTime,
    ) -> Result<Option<MillisDurationU32>, Error> {
        let mut timing = bus.read_register(self.address, CMD | REG_TIMING)?;
        match gain {
            Gain::High => timing |= GAIN_BIT,
            Gain::Low => timing &= !GAIN_BIT,
        }
        timing &= !INTEG_MASK;
        timing |= integration.bits();
        bus.write_register(self.address, CMD | REG_TIMING, timing)?;
        Ok(integration.period())
    }

    /// Part number / revision register.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn read_id<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<u8, Error> {
        bus.read_register(self.address, CMD | REG_ID)
    }

    /// Read both raw channels: (broadband, infrared).
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn read_channels<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(u16, u16), Error> {
        let broadband = self.read_channel(bus, REG_DATA0_LOW)?;
        let infrared = self.read_channel(bus, REG_DATA1_LOW)?;
        Ok((broadband, infrared))
    }

    fn read_channel<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        register: u8,
    ) -> Result<u16, Error> {
        let command = [CMD | register];
        let request = ReadRequest::new(self.address, &command, 2);
        let bytes = bus.execute_read(&request)?;
        let low = bytes.first().copied().ok_or(Error::ShortRead)?;
        let high = bytes.get(1).copied().ok_or(Error::ShortRead)?;
        Ok((u16::from(high) << 8) | u16::from(low))
    }
}
