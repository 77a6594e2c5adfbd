// Licensed under the Apache-2.0 license

//! Node-wide compile-time configuration.
//!
//! Buffer capacities bound every I2C transaction on the node; they must be
//! large enough for the largest packet any driver sends or expects back.
//! Device addresses are the 7-bit bus addresses of the peripherals populated
//! on the sensor board.

/// Capacity of the outbound (command/write) staging area in bytes.
pub const I2C_SEND_BUFFER_SIZE: usize = 0x20;

/// Capacity of the inbound (read) staging area in bytes.
pub const I2C_RECEIVE_BUFFER_SIZE: usize = 0x20;

/// Transaction buffer capacity: covers both directions.
pub const I2C_BUFFER_CAPACITY: usize = if I2C_SEND_BUFFER_SIZE > I2C_RECEIVE_BUFFER_SIZE {
    I2C_SEND_BUFFER_SIZE
} else {
    I2C_RECEIVE_BUFFER_SIZE
};

/// TSL2561 ambient/IR light sensor, ADDR pin grounded.
pub const LIGHT_SENSOR_ADDRESS: u8 = 0x39;

/// HIH6130 humidity/temperature sensor.
pub const HUMIDITY_SENSOR_ADDRESS: u8 = 0x27;

/// BMP180 pressure/temperature sensor.
pub const PRESSURE_SENSOR_ADDRESS: u8 = 0x77;

/// DS1307 real-time clock.
pub const RTC_ADDRESS: u8 = 0x68;

/// AT24C32 buffer EEPROM (32 Kbit).
pub const EEPROM_ADDRESS: u8 = 0x50;

/// Every populated device, for bus scans.
pub const DEVICE_ADDRESSES: [u8; 5] = [
    LIGHT_SENSOR_ADDRESS,
    HUMIDITY_SENSOR_ADDRESS,
    PRESSURE_SENSOR_ADDRESS,
    RTC_ADDRESS,
    EEPROM_ADDRESS,
];

// 0x00 is the general-call address and never a device.
const _: () = assert!(
    LIGHT_SENSOR_ADDRESS != 0
        && HUMIDITY_SENSOR_ADDRESS != 0
        && PRESSURE_SENSOR_ADDRESS != 0
        && RTC_ADDRESS != 0
        && EEPROM_ADDRESS != 0
);
