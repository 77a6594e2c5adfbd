// Licensed under the Apache-2.0 license

//! Mock transport for unit tests.
//!
//! Models the bus as a set of register-file devices with auto-incrementing
//! address pointers (the behavior of the EEPROM, RTC and sensor parts on the
//! node), plus fault injection knobs for the failure-path tests. Writes are
//! recorded verbatim so tests can assert on the exact transmitted framing.

use std::collections::HashMap;

use crate::i2c::common::{AckPolicy, Direction, Fault};
use crate::i2c::traits::I2cTransport;

pub(crate) struct MockDevice {
    /// Memory-pointer width in bytes: 1 for register devices, 2 for the
    /// EEPROM's big-endian addressing.
    address_width: usize,
    registers: HashMap<u16, u8>,
    pointer: u16,
    /// When set, reads serve this frame from its start instead of the
    /// register file (devices like the HIH6130 have no register pointer).
    frame: Option<Vec<u8>>,
}

enum Phase {
    Idle,
    Writing { address: u8, bytes: Vec<u8> },
    Reading { address: u8, served: usize },
}

pub(crate) struct MockTransport {
    devices: HashMap<u8, MockDevice>,
    phase: Phase,
    /// Completed write payloads, in issue order.
    pub writes: Vec<(u8, Vec<u8>)>,
    /// NACK the write byte at this zero-based position within a phase.
    pub nack_data_after: Option<usize>,
    /// Serve at most this many bytes per read phase, then hold WouldBlock.
    pub read_limit: Option<usize>,
    /// Never produce a read byte.
    pub stall_reads: bool,
    /// Never accept a write byte.
    pub stall_writes: bool,
    /// Number of start conditions issued.
    pub starts: usize,
    last_fault: Option<Fault>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            devices: HashMap::new(),
            phase: Phase::Idle,
            writes: Vec::new(),
            nack_data_after: None,
            read_limit: None,
            stall_reads: false,
            stall_writes: false,
            starts: 0,
            last_fault: None,
        }
    }

    pub(crate) fn add_device(&mut self, address: u8, address_width: usize) {
        self.devices.insert(
            address,
            MockDevice {
                address_width,
                registers: HashMap::new(),
                pointer: 0,
                frame: None,
            },
        );
    }

    pub(crate) fn set_register(&mut self, address: u8, register: u16, value: u8) {
        if let Some(device) = self.devices.get_mut(&address) {
            device.registers.insert(register, value);
        }
    }

    pub(crate) fn register(&self, address: u8, register: u16) -> Option<u8> {
        self.devices
            .get(&address)
            .and_then(|device| device.registers.get(&register).copied())
    }

    pub(crate) fn set_frame(&mut self, address: u8, frame: &[u8]) {
        if let Some(device) = self.devices.get_mut(&address) {
            device.frame = Some(frame.to_vec());
        }
    }

    fn fault(&mut self, fault: Fault) -> Fault {
        self.last_fault = Some(fault);
        fault
    }

    fn apply_write(device: &mut MockDevice, bytes: &[u8]) {
        if bytes.len() < device.address_width {
            return;
        }
        let (pointer_bytes, payload) = bytes.split_at(device.address_width);
        device.pointer = pointer_bytes
            .iter()
            .fold(0u16, |acc, &b| (acc << 8) | u16::from(b));
        for &value in payload {
            device.registers.insert(device.pointer, value);
            device.pointer = device.pointer.wrapping_add(1);
        }
    }
}

impl I2cTransport for MockTransport {
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), Fault> {
        if !self.devices.contains_key(&address) {
            return Err(self.fault(Fault::AddressNack));
        }
        self.starts += 1;
        self.phase = match direction {
            Direction::Write => Phase::Writing {
                address,
                bytes: Vec::new(),
            },
            Direction::Read => Phase::Reading { address, served: 0 },
        };
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Fault> {
        if self.stall_writes {
            return Err(nb::Error::WouldBlock);
        }
        let nack_at = self.nack_data_after;
        let accepted = match &mut self.phase {
            Phase::Writing { bytes, .. } => {
                if nack_at == Some(bytes.len()) {
                    false
                } else {
                    bytes.push(byte);
                    true
                }
            }
            _ => return Err(nb::Error::Other(Fault::Bus)),
        };
        if accepted {
            Ok(())
        } else {
            Err(nb::Error::Other(self.fault(Fault::DataNack)))
        }
    }

    fn read_byte(&mut self, _ack: AckPolicy) -> nb::Result<u8, Fault> {
        if self.stall_reads {
            return Err(nb::Error::WouldBlock);
        }
        let limit = self.read_limit;
        match &mut self.phase {
            Phase::Reading { address, served } => {
                if let Some(limit) = limit {
                    if *served >= limit {
                        return Err(nb::Error::WouldBlock);
                    }
                }
                let device = match self.devices.get_mut(address) {
                    Some(device) => device,
                    None => return Err(nb::Error::Other(Fault::Bus)),
                };
                let byte = if let Some(frame) = &device.frame {
                    frame.get(*served).copied().unwrap_or(0xFF)
                } else {
                    let value = device.registers.get(&device.pointer).copied().unwrap_or(0xFF);
                    device.pointer = device.pointer.wrapping_add(1);
                    value
                };
                *served += 1;
                Ok(byte)
            }
            _ => Err(nb::Error::Other(Fault::Bus)),
        }
    }

    fn stop(&mut self) -> Result<(), Fault> {
        if let Phase::Writing { address, bytes } =
            core::mem::replace(&mut self.phase, Phase::Idle)
        {
            if let Some(device) = self.devices.get_mut(&address) {
                Self::apply_write(device, &bytes);
            }
            self.writes.push((address, bytes));
        }
        Ok(())
    }

    fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }
}

/// Delay recorder for scheduler tests.
#[derive(Default)]
pub(crate) struct MockDelay {
    pub delays_ns: Vec<u32>,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns);
    }
}

impl MockDelay {
    pub(crate) fn delays_ms(&self) -> Vec<u32> {
        self.delays_ns.iter().map(|ns| ns / 1_000_000).collect()
    }
}
