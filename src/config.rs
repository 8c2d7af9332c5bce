use crate::telemetry::DEVICE_ADDRESS;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::{Read, Write};

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    SerializeError(String),
    InvalidEntry(String),
    MissingEntry(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&match self {
            ConfigError::SerializeError(msg) => format!("serialize/parse error: {}", msg),
            ConfigError::InvalidEntry(msg) => format!("invalid config entry: {}", msg),
            ConfigError::MissingEntry(msg) => format!("missing config entry: {}", msg),
        })
    }
}

impl std::error::Error for ConfigError {}

fn default_bus_id() -> u8 {
    1
}

fn default_device_address() -> u16 {
    DEVICE_ADDRESS
}

fn default_refresh_interval() -> u64 {
    1000
}

fn default_shutdown_command() -> Vec<String> {
    vec!["shutdown".to_string(), "-h".to_string(), "now".to_string()]
}

fn default_sync_command() -> Vec<String> {
    vec!["sync".to_string()]
}

fn default_display_width() -> u32 {
    250
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpsLiteConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Charge percentage at or below which the host is powered off. There is
    /// deliberately no default.
    pub shutdown: f32,
    #[serde(default = "default_bus_id")]
    pub bus_id: u8,
    #[serde(default = "default_device_address")]
    pub device_address: u16,
    #[serde(default)]
    pub show_voltage: bool,
}

impl UpsLiteConfig {
    #[cfg(test)]
    pub fn new(shutdown: f32) -> Self {
        Self {
            enabled: true,
            shutdown,
            bus_id: default_bus_id(),
            device_address: default_device_address(),
            show_voltage: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.shutdown.is_finite() || !(0.0..=100.0).contains(&self.shutdown) {
            return Err(ConfigError::InvalidEntry(format!(
                "shutdown threshold must be a percentage between 0 and 100, got {}",
                self.shutdown
            )));
        }

        if self.device_address > 0x7F {
            return Err(ConfigError::InvalidEntry(format!(
                "device address {:#x} is not a valid 7-bit I2C address",
                self.device_address
            )));
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HostConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_shutdown_command")]
    pub shutdown_command: Vec<String>,
    /// Run before the shutdown command, empty to skip.
    #[serde(default = "default_sync_command")]
    pub sync_command: Vec<String>,
    #[serde(default = "default_display_width")]
    pub display_width: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            shutdown_command: default_shutdown_command(),
            sync_command: default_sync_command(),
            display_width: default_display_width(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidEntry("refresh interval cannot be zero".to_string()));
        }

        match self.shutdown_command.first() {
            Some(program) if !program.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingEntry("shutdown command cannot be empty".to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Configuration {
    #[serde(default)]
    pub host: HostConfig,
    pub ups_lite: UpsLiteConfig,
}

impl Configuration {
    #[cfg(test)]
    pub fn new(host: HostConfig, ups_lite: UpsLiteConfig) -> Self {
        Self { host, ups_lite }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.host.validate()?;
        self.ups_lite.validate()?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Configuration, ConfigError> {
        let config: Configuration = match serde_json::from_reader(reader) {
            Ok(c) => c,
            Err(e) => {
                return Err(ConfigError::SerializeError(
                    format!("failed to deserialize config file: {}", e)
                ));
            }
        };

        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    pub fn from_str(json_str: &str) -> Result<Configuration, ConfigError> {
        Self::from_reader(json_str.as_bytes())
    }

    pub fn to_writer<W: Write>(&self, writer: W, pretty: bool) -> Result<(), ConfigError> {
        let result = if pretty {
            serde_json::to_writer_pretty(writer, self)
        } else {
            serde_json::to_writer(writer, self)
        };

        result.map_err(|e| ConfigError::SerializeError(format!("failed to serialize config: {}", e)))
    }

    pub fn to_str(&self, pretty: bool) -> Result<String, ConfigError> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf, pretty)?;
        String::from_utf8(buf)
            .map_err(|e| ConfigError::SerializeError(format!("serialized config is not UTF-8: {}", e)))
    }
}
