use std::fmt::Display;

#[derive(Debug, PartialEq, Clone)]
pub enum BusError {
    NotSupported(String),
    BusNotFound(u8),
    InvalidAddress(u16),
    HardwareError(String),
}

impl Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&match self {
            BusError::NotSupported(msg) => format!("not supported: {}", msg),
            BusError::BusNotFound(bus_id) => format!("I2C bus {} does not exist", bus_id),
            BusError::InvalidAddress(address) => format!("invalid slave address: {:#04x}", address),
            BusError::HardwareError(msg) => format!("hardware error: {}", msg),
        })
    }
}

impl std::error::Error for BusError {}

/// An open, exclusively owned connection to one device on a register-oriented bus.
pub trait BusChannel {
    /// Reads a 16-bit word from `register`, in the byte order the transport delivers it.
    fn read_word(&mut self, register: u8) -> Result<u16, BusError>;

    /// Releases the connection. Channels that need no teardown rely on `Drop`.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Opens channels to a device address on a given bus.
pub trait BusConnector {
    type Channel: BusChannel;

    fn open(&self, bus_id: u8, address: u16) -> Result<Self::Channel, BusError>;
}

// Bus implementations
pub mod i2c_sysfs; // SysfsI2cConnector
