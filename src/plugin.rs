use crate::bus::{BusChannel, BusConnector, BusError};
use crate::config::UpsLiteConfig;
use crate::controller::{format_capacity, PollState, PollingController};
use crate::display::{DisplayError, Font, LabeledValue, StatusSurface};
use crate::shutdown::ShutdownTrigger;
use crate::telemetry::{BatterySample, TelemetryReader};
use log::{info, warn};
use parking_lot::Mutex;
use std::fmt::Display;

pub const ELEMENT_KEY: &str = "ups";
const ELEMENT_LABEL: &str = "UPS";
const ELEMENT_X_OFFSET: u32 = 15;

#[derive(Debug, PartialEq)]
pub enum PluginError {
    Bus(BusError),
    Display(DisplayError),
    InvalidOperation(String),
    InvalidConfig(String),
}

impl Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&match self {
            PluginError::Bus(e) => format!("bus error: {}", e),
            PluginError::Display(e) => format!("display error: {}", e),
            PluginError::InvalidOperation(desc) => format!("invalid operation: {}", desc),
            PluginError::InvalidConfig(desc) => format!("invalid config: {}", desc),
        })
    }
}

impl std::error::Error for PluginError {}

impl From<BusError> for PluginError {
    fn from(err: BusError) -> Self {
        PluginError::Bus(err)
    }
}

impl From<DisplayError> for PluginError {
    fn from(err: DisplayError) -> Self {
        PluginError::Display(err)
    }
}

/// Lifecycle hooks a host drives on each loaded plugin.
pub trait Plugin {
    fn name(&self) -> String;
    fn is_active(&self) -> bool;
    fn activate(&mut self, surface: &Mutex<dyn StatusSurface>) -> Result<(), PluginError>;
    /// Called once per display refresh with the surface the refresh loop already holds.
    fn on_tick(&mut self, surface: &mut dyn StatusSurface);
    fn deactivate(&mut self, surface: &Mutex<dyn StatusSurface>) -> Result<(), PluginError>;
}

struct ActiveMonitor<B: BusChannel> {
    reader: TelemetryReader<B>,
    controller: PollingController,
}

/// Battery indicator and low-charge shutdown for the UPS Lite fuel gauge.
pub struct UpsLite<C: BusConnector, T: ShutdownTrigger> {
    config: UpsLiteConfig,
    connector: C,
    trigger: T,
    monitor: Option<ActiveMonitor<C::Channel>>,
}

impl<C: BusConnector, T: ShutdownTrigger> UpsLite<C, T> {
    pub fn new(config: UpsLiteConfig, connector: C, trigger: T) -> Result<Self, PluginError> {
        config
            .validate()
            .map_err(|e| PluginError::InvalidConfig(e.to_string()))?;

        Ok(UpsLite {
            config,
            connector,
            trigger,
            monitor: None,
        })
    }

    pub fn state(&self) -> Option<PollState> {
        self.monitor.as_ref().map(|m| m.controller.state())
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state() == Some(PollState::ShuttingDown)
    }

    /// Reads voltage and charge outside the refresh cycle, e.g. for diagnostics.
    pub fn sample(&mut self) -> Option<BatterySample> {
        self.monitor.as_mut().map(|m| m.reader.sample())
    }
}

#[cfg(test)]
impl<C: BusConnector, T: ShutdownTrigger> UpsLite<C, T> {
    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }
}

impl<C: BusConnector, T: ShutdownTrigger> Plugin for UpsLite<C, T> {
    fn name(&self) -> String {
        "ups_lite".to_string()
    }

    fn is_active(&self) -> bool {
        self.monitor.is_some()
    }

    fn activate(&mut self, surface: &Mutex<dyn StatusSurface>) -> Result<(), PluginError> {
        if self.monitor.is_some() {
            return Err(PluginError::InvalidOperation(
                "activation requested but this plugin is already active".to_string(),
            ));
        }

        let channel = self.connector.open(self.config.bus_id, self.config.device_address)?;
        let controller = PollingController::new(self.config.shutdown, ELEMENT_KEY)
            .with_voltage(self.config.show_voltage);

        {
            let mut ui = surface.lock();
            let position = (ui.width() / 2 + ELEMENT_X_OFFSET, 0);
            ui.add_element(
                ELEMENT_KEY,
                LabeledValue {
                    label: ELEMENT_LABEL.to_string(),
                    value: format_capacity(0.0),
                    position,
                    label_font: Font::Bold,
                    text_font: Font::Medium,
                },
            );
        }

        info!(
            "[ups_lite] monitoring bus {} device {:#04x}, shutdown at {}%",
            self.config.bus_id, self.config.device_address, self.config.shutdown
        );
        self.monitor = Some(ActiveMonitor {
            reader: TelemetryReader::new(channel),
            controller,
        });
        Ok(())
    }

    fn on_tick(&mut self, surface: &mut dyn StatusSurface) {
        match self.monitor.as_mut() {
            Some(monitor) => {
                monitor
                    .controller
                    .tick(&mut monitor.reader, surface, &mut self.trigger);
            }
            None => warn!("[ups_lite] refresh tick received while inactive"),
        }
    }

    fn deactivate(&mut self, surface: &Mutex<dyn StatusSurface>) -> Result<(), PluginError> {
        let monitor = match self.monitor.take() {
            Some(m) => m,
            None => {
                return Err(PluginError::InvalidOperation(
                    "deactivation requested but this plugin isn't active".to_string(),
                ))
            }
        };

        info!("[ups_lite] deactivating in state {}", monitor.controller.state());
        monitor.reader.into_inner().close();

        let result = surface.lock().remove_element(ELEMENT_KEY);
        result.map_err(PluginError::from)
    }
}
