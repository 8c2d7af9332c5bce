use super::{BusChannel, BusConnector, BusError};
use i2c_linux::I2c;
use log::debug;
use std::{fs::File, io::ErrorKind, path::Path};

const I2C_CLASS_PATH: &str = "/sys/class/i2c-dev";
const I2C_DEVICE_PATH: &str = "/dev";
const MAX_7BIT_ADDRESS: u16 = 0x7F;

fn sysfs_map_err(err: std::io::Error, default_err_msg: &str) -> BusError {
    BusError::HardwareError(format!("{}: {}", default_err_msg, err))
}

/// Opens SMBus channels through the Linux i2c-dev interface.
pub struct SysfsI2cConnector;

impl SysfsI2cConnector {
    pub fn new() -> Result<Self, BusError> {
        let path = Path::new(I2C_CLASS_PATH);
        if !path.exists() || !path.is_dir() {
            return Err(BusError::NotSupported(
                "I2C is not supported on this system, is i2c-dev enabled?".to_string(),
            ));
        }

        Ok(SysfsI2cConnector)
    }
}

impl BusConnector for SysfsI2cConnector {
    type Channel = SysfsI2cChannel;

    fn open(&self, bus_id: u8, address: u16) -> Result<SysfsI2cChannel, BusError> {
        if address > MAX_7BIT_ADDRESS {
            return Err(BusError::InvalidAddress(address));
        }

        let device_path = Path::new(I2C_DEVICE_PATH).join(format!("i2c-{}", bus_id));
        let mut bus = match I2c::from_path(&device_path) {
            Ok(bus) => bus,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(BusError::BusNotFound(bus_id)),
            Err(e) => {
                return Err(sysfs_map_err(
                    e,
                    &format!("Internal sysfs error while opening I2C bus {}", bus_id),
                ))
            }
        };

        bus.smbus_set_slave_address(address, false)
            .map_err(|err| sysfs_map_err(err, &format!("failed to select slave address {:#04x}", address)))?;

        debug!("Opened I2C bus {} for device {:#04x}", bus_id, address);
        Ok(SysfsI2cChannel { bus_id, address, bus })
    }
}

pub struct SysfsI2cChannel {
    bus_id: u8,
    address: u16,
    bus: I2c<File>,
}

impl BusChannel for SysfsI2cChannel {
    fn read_word(&mut self, register: u8) -> Result<u16, BusError> {
        self.bus.smbus_read_word_data(register).map_err(|err| {
            sysfs_map_err(
                err,
                &format!(
                    "failed to read register {} from device {:#04x} on bus {}",
                    register, self.address, self.bus_id
                ),
            )
        })
    }
}

impl Drop for SysfsI2cChannel {
    fn drop(&mut self) {
        debug!("Closing I2C bus {} (device {:#04x})", self.bus_id, self.address);
    }
}
