mod bus;
mod config;
mod controller;
mod display;
mod plugin;
mod shutdown;
mod telemetry;
#[cfg(test)]
mod tests;

use std::{
    error::Error,
    fs::File,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use bus::i2c_sysfs::SysfsI2cConnector;
use config::Configuration;
use display::{ConsoleSurface, StatusSurface};
use log::{debug, error, info, LevelFilter};
use parking_lot::Mutex;
use plugin::{Plugin, UpsLite};
use shutdown::SystemShutdown;

const DEFAULT_CONFIG_PATH: &str = "/etc/ups_lite/config.json";

fn load_config() -> Result<Configuration, Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!("Loading configuration from {}", path);
    let file = File::open(&path).map_err(|e| format!("failed to open {}: {}", path, e))?;
    Ok(Configuration::from_reader(file)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let config = load_config()?;
    debug!("Effective configuration: {}", config.to_str(false)?);
    if !config.ups_lite.enabled {
        info!("ups_lite is disabled in the configuration, nothing to do");
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let surface = Mutex::new(ConsoleSurface::new(config.host.display_width));
    let trigger = SystemShutdown::new(config.host.shutdown_command.clone())
        .with_sync_command(config.host.sync_command.clone());
    let mut plugin = UpsLite::new(config.ups_lite.clone(), SysfsI2cConnector::new()?, trigger)?;

    info!("Activating {}", plugin.name());
    plugin.activate(&surface)?;
    if let Some(sample) = plugin.sample() {
        info!(
            "Battery at {:.1}% ({:.2}V){}",
            sample.capacity.value,
            sample.voltage.value,
            if sample.capacity.fault || sample.voltage.fault { ", sensor read failed" } else { "" }
        );
    }

    let mut interval = tokio::time::interval(Duration::from_millis(config.host.refresh_interval_ms));
    while running.load(Ordering::SeqCst) {
        interval.tick().await;

        let mut ui = surface.lock();
        plugin.on_tick(&mut *ui);
        ui.update(false, &[]);
        drop(ui);

        if plugin.is_shutting_down() {
            info!("Shutdown requested, leaving refresh loop");
            break;
        }
    }

    if plugin.is_active() {
        if let Err(e) = plugin.deactivate(&surface) {
            error!("Failed to deactivate {}: {}", plugin.name(), e);
        }
    }

    Ok(())
}
