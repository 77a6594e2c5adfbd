// Licensed under the Apache-2.0 license

//! I2C driver stack for the sensor node.
//!
//! The transaction engine frames register reads/writes as bus transactions
//! over an opaque transport, the typed accessors decode the staged bytes,
//! and the controller ties engine, configuration and logging together while
//! exposing an embedded-hal `I2c` implementation.

pub mod common;
pub mod engine;
pub mod i2c_controller;
pub mod registers;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;
