// Licensed under the Apache-2.0 license

//! Sensor and peripheral drivers for the node's I2C devices.
//!
//! Every driver is a plain struct holding its bus address and device state;
//! operations take the bus controller as an explicit collaborator, so each
//! driver can be exercised against a mock transport in isolation.

pub mod bmp180;
pub mod ds1307;
pub mod eeprom;
pub mod hih6130;
pub mod tsl2561;
