// Licensed under the Apache-2.0 license

//! BMP180 barometric pressure and temperature sensor.
//!
//! The device ships factory calibration in eleven 16-bit words; every
//! measurement is compensated with the datasheet's integer pipeline.
//! Conversions are started explicitly and the caller owns the wait: start
//! commands return the datasheet conversion delay so the polling service can
//! schedule the readout. Pressure compensation needs the B5 intermediate
//! from a preceding temperature readout.

use crate::common::Logger;
use crate::config::PRESSURE_SENSOR_ADDRESS;
use crate::i2c::common::Error;
use crate::i2c::engine::ReadRequest;
use crate::i2c::i2c_controller::I2cController;
use crate::i2c::traits::I2cTransport;
use fugit::MillisDurationU32;

const REG_CALIBRATION: u8 = 0xAA;
const REG_CONTROL: u8 = 0xF4;
const REG_RESULT: u8 = 0xF6;
const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;

/// Factory calibration words (datasheet register map 0xAA..=0xBF).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

/// Pressure oversampling setting; higher settings take longer but reduce
/// noise.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Oversampling {
    UltraLowPower,
    Standard,
    HighResolution,
    UltraHighResolution,
}

impl Oversampling {
    fn index(self) -> u8 {
        match self {
            Oversampling::UltraLowPower => 0,
            Oversampling::Standard => 1,
            Oversampling::HighResolution => 2,
            Oversampling::UltraHighResolution => 3,
        }
    }

    fn command(self) -> u8 {
        CMD_PRESSURE + (self.index() << 6)
    }

    /// Conversion time from the datasheet for this setting.
    #[must_use]
    pub fn conversion_delay(self) -> MillisDurationU32 {
        let ms = match self {
            Oversampling::UltraLowPower => 5,
            Oversampling::Standard => 8,
            Oversampling::HighResolution => 14,
            Oversampling::UltraHighResolution => 26,
        };
        MillisDurationU32::from_ticks(ms)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bmp180Error {
    Bus(Error),
    /// No device acknowledged the sensor address.
    NotPresent,
    /// A calibration word read back as 0x0000 or 0xFFFF, or the device was
    /// never initialized.
    Calibration,
    /// Pressure compensation was requested before any temperature readout.
    TemperatureRequired,
}

impl From<Error> for Bmp180Error {
    fn from(error: Error) -> Self {
        Bmp180Error::Bus(error)
    }
}

pub struct Bmp180 {
    address: u8,
    calibration: Option<Calibration>,
    b5: Option<i32>,
}

impl Default for Bmp180 {
    fn default() -> Self {
        Self::new()
    }
}

impl Bmp180 {
    #[must_use]
    pub fn new() -> Self {
        Self::at_address(PRESSURE_SENSOR_ADDRESS)
    }

    #[must_use]
    pub fn at_address(address: u8) -> Self {
        Self {
            address,
            calibration: None,
            b5: None,
        }
    }

    /// Check the device is present and load its calibration words.
    ///
    /// # Errors
    ///
    /// `NotPresent` if the address probe is not acknowledged,
    /// `Calibration` if any word is 0x0000/0xFFFF, or a bus error.
    pub fn begin<T: I2cTransport, L: Logger>(
        &mut self,
        bus: &mut I2cController<T, L>,
    ) -> Result<(), Bmp180Error> {
        if !bus.check_presence(self.address) {
            return Err(Bmp180Error::NotPresent);
        }

        let mut words = [0u16; 11];
        for (index, word) in words.iter_mut().enumerate() {
            let register = REG_CALIBRATION + (index as u8) * 2;
            let raw = bus.read_register_u16(self.address, register)?;
            if raw == 0x0000 || raw == 0xFFFF {
                return Err(Bmp180Error::Calibration);
            }
            *word = raw;
        }

        let [ac1, ac2, ac3, ac4, ac5, ac6, b1, b2, mb, mc, md] = words;
        self.calibration = Some(Calibration {
            ac1: ac1 as i16,
            ac2: ac2 as i16,
            ac3: ac3 as i16,
            ac4,
            ac5,
            ac6,
            b1: b1 as i16,
            b2: b2 as i16,
            mb: mb as i16,
            mc: mc as i16,
            md: md as i16,
        });
        Ok(())
    }

    #[must_use]
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Command a temperature conversion; wait the returned delay before
    /// reading.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn start_temperature<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
    ) -> Result<MillisDurationU32, Bmp180Error> {
        bus.write_register(self.address, REG_CONTROL, CMD_TEMPERATURE)?;
        Ok(MillisDurationU32::from_ticks(5))
    }

    /// Read and compensate the temperature, in tenths of a degree Celsius.
    ///
    /// Also captures the B5 intermediate needed by pressure compensation.
    ///
    /// # Errors
    ///
    /// `Calibration` if `begin` has not succeeded, or a bus error.
    pub fn read_temperature<T: I2cTransport, L: Logger>(
        &mut self,
        bus: &mut I2cController<T, L>,
    ) -> Result<i32, Bmp180Error> {
        let calibration = self.calibration.ok_or(Bmp180Error::Calibration)?;
        let ut = i32::from(bus.read_register_u16(self.address, REG_RESULT)?);
        let (deci_celsius, b5) =
            compensate_temperature(&calibration, ut).ok_or(Bmp180Error::Calibration)?;
        self.b5 = Some(b5);
        Ok(deci_celsius)
    }

    /// Command a pressure conversion at the given oversampling; wait the
    /// returned delay before reading.
    ///
    /// # Errors
    ///
    /// Propagates bus errors.
    pub fn start_pressure<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        oversampling: Oversampling,
    ) -> Result<MillisDurationU32, Bmp180Error> {
        bus.write_register(self.address, REG_CONTROL, oversampling.command())?;
        Ok(oversampling.conversion_delay())
    }

    /// Read and compensate the pressure, in Pascal.
    ///
    /// # Errors
    ///
    /// `TemperatureRequired` if no temperature readout preceded this call,
    /// `Calibration` if `begin` has not succeeded, or a bus error.
    pub fn read_pressure<T: I2cTransport, L: Logger>(
        &self,
        bus: &mut I2cController<T, L>,
        oversampling: Oversampling,
    ) -> Result<i32, Bmp180Error> {
        let calibration = self.calibration.ok_or(Bmp180Error::Calibration)?;
        let b5 = self.b5.ok_or(Bmp180Error::TemperatureRequired)?;

        let command = [REG_RESULT];
        let request = ReadRequest::new(self.address, &command, 3);
        let bytes = bus.execute_read(&request)?;
        let msb = bytes.first().copied().ok_or(Error::ShortRead)?;
        let lsb = bytes.get(1).copied().ok_or(Error::ShortRead)?;
        let xlsb = bytes.get(2).copied().ok_or(Error::ShortRead)?;

        let oss = u32::from(oversampling.index());
        let raw = (u32::from(msb) << 16) | (u32::from(lsb) << 8) | u32::from(xlsb);
        let up = (raw >> (8 - oss)) as i32;

        compensate_pressure(&calibration, b5, up, oss).ok_or(Bmp180Error::Calibration)
    }
}

/// Datasheet integer temperature compensation. Returns (deci-°C, B5).
fn compensate_temperature(cal: &Calibration, ut: i32) -> Option<(i32, i32)> {
    let x1 = ((ut - i32::from(cal.ac6)) * i32::from(cal.ac5)) >> 15;
    let denominator = x1 + i32::from(cal.md);
    if denominator == 0 {
        return None;
    }
    let x2 = (i32::from(cal.mc) << 11) / denominator;
    let b5 = x1 + x2;
    Some(((b5 + 8) >> 4, b5))
}

/// Datasheet integer pressure compensation. Returns Pascal.
fn compensate_pressure(cal: &Calibration, b5: i32, up: i32, oss: u32) -> Option<i32> {
    let b6 = b5 - 4000;
    let x1 = (i32::from(cal.b2) * ((b6 * b6) >> 12)) >> 11;
    let x2 = (i32::from(cal.ac2) * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((i32::from(cal.ac1) * 4 + x3) << oss) + 2) / 4;

    let x1 = (i32::from(cal.ac3) * b6) >> 13;
    let x2 = (i32::from(cal.b1) * ((b6 * b6) >> 12)) >> 16;
    let x3 = (x1 + x2 + 2) >> 2;
    let b4 = (u32::from(cal.ac4) * ((x3 + 32768) as u32)) >> 15;
    if b4 == 0 {
        return None;
    }

    let b7 = ((up - b3) as u32) * (50_000 >> oss);
    let pressure = if b7 < 0x8000_0000 {
        ((b7 * 2) / b4) as i32
    } else {
        ((b7 / b4) * 2) as i32
    };

    let x1 = (pressure >> 8) * (pressure >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * pressure) >> 16;
    Some(pressure + ((x1 + x2 + 3791) >> 4))
}
