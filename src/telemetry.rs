use crate::bus::{BusChannel, BusError};
use log::error;

pub const DEVICE_ADDRESS: u16 = 0x36;
pub const REGISTER_VOLTAGE: u8 = 2;
pub const REGISTER_CAPACITY: u8 = 4;

const VOLTAGE_LSB_MILLIVOLTS: f32 = 1.25;
const VOLTAGE_DIVIDER: f32 = 16.0;
const CAPACITY_DIVIDER: f32 = 256.0;

/// The fuel gauge returns words with their bytes in the opposite order from the
/// one the scaling formulas expect.
pub const fn byte_swap16(value: u16) -> u16 {
    ((value & 0xFF) << 8) | ((value >> 8) & 0xFF)
}

pub fn raw_to_voltage(raw: u16) -> f32 {
    byte_swap16(raw) as f32 * VOLTAGE_LSB_MILLIVOLTS / 1000.0 / VOLTAGE_DIVIDER
}

pub fn raw_to_capacity(raw: u16) -> f32 {
    byte_swap16(raw) as f32 / CAPACITY_DIVIDER
}

/// A converted reading. `fault` is set when the bus read failed and `value`
/// is the `0.0` fallback rather than a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f32,
    pub fault: bool,
}

impl Sample {
    fn measured(value: f32) -> Self {
        Sample { value, fault: false }
    }

    fn faulted() -> Self {
        Sample { value: 0.0, fault: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySample {
    pub voltage: Sample,
    pub capacity: Sample,
}

pub struct TelemetryReader<B: BusChannel> {
    channel: B,
}

impl<B: BusChannel> TelemetryReader<B> {
    pub fn new(channel: B) -> Self {
        TelemetryReader { channel }
    }

    fn read_converted(&mut self, register: u8, convert: fn(u16) -> f32) -> Sample {
        match self.channel.read_word(register) {
            Ok(raw) => Sample::measured(convert(raw)),
            Err(e) => {
                log_fault(register, &e);
                Sample::faulted()
            }
        }
    }

    pub fn read_voltage(&mut self) -> Sample {
        self.read_converted(REGISTER_VOLTAGE, raw_to_voltage)
    }

    pub fn read_capacity(&mut self) -> Sample {
        self.read_converted(REGISTER_CAPACITY, raw_to_capacity)
    }

    /// Battery voltage in volts, `0.0` if the gauge could not be read.
    pub fn voltage(&mut self) -> f32 {
        self.read_voltage().value
    }

    /// Remaining charge in percent, `0.0` if the gauge could not be read.
    pub fn capacity(&mut self) -> f32 {
        self.read_capacity().value
    }

    /// Reads both registers back to back. The reads are not atomic and either
    /// one may fail on its own.
    pub fn sample(&mut self) -> BatterySample {
        let voltage = self.read_voltage();
        let capacity = self.read_capacity();
        BatterySample { voltage, capacity }
    }

    pub fn into_inner(self) -> B {
        self.channel
    }
}

fn log_fault(register: u8, err: &BusError) {
    error!("[ups_lite] failed to read register {}: {}", register, err);
}
