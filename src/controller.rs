use crate::bus::BusChannel;
use crate::display::StatusSurface;
use crate::shutdown::ShutdownTrigger;
use crate::telemetry::TelemetryReader;
use log::{debug, error, info};
use strum::Display;

pub const SHUTDOWN_MESSAGE: &str = "Battery exhausted, bye ...";
pub const STATUS_KEY: &str = "status";

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Reading,
    Evaluating,
    ShuttingDown,
}

/// Renders the charge as a whole percentage, dropping the fractional part.
pub fn format_capacity(capacity: f32) -> String {
    format!("{}%", capacity.trunc() as i64)
}

pub fn format_capacity_with_voltage(capacity: f32, voltage: f32) -> String {
    format!("{}/{:.1}V", format_capacity(capacity), voltage)
}

pub struct PollingController {
    threshold: f32,
    element_key: String,
    show_voltage: bool,
    state: PollState,
}

impl PollingController {
    pub fn new(threshold: f32, element_key: &str) -> Self {
        PollingController {
            threshold,
            element_key: element_key.to_string(),
            show_voltage: false,
            state: PollState::Idle,
        }
    }

    pub fn with_voltage(mut self, show_voltage: bool) -> Self {
        self.show_voltage = show_voltage;
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn should_shutdown(&self, capacity: f32) -> bool {
        capacity <= self.threshold
    }

    /// Runs one refresh cycle: read the charge, show it, and power the host off
    /// once it is at or below the threshold.
    ///
    /// `ShuttingDown` is latched. Once entered, later ticks neither touch the bus
    /// nor invoke the trigger again.
    pub fn tick<B: BusChannel, T: ShutdownTrigger + ?Sized>(
        &mut self,
        reader: &mut TelemetryReader<B>,
        surface: &mut dyn StatusSurface,
        trigger: &mut T,
    ) -> PollState {
        if self.state == PollState::ShuttingDown {
            debug!("[ups_lite] shutdown already requested, ignoring tick");
            return self.state;
        }

        self.state = PollState::Reading;
        let capacity = reader.capacity();
        let value = if self.show_voltage {
            format_capacity_with_voltage(capacity, reader.voltage())
        } else {
            format_capacity(capacity)
        };
        surface.set(&self.element_key, value);

        self.state = PollState::Evaluating;
        if !self.should_shutdown(capacity) {
            self.state = PollState::Idle;
            return self.state;
        }

        self.state = PollState::ShuttingDown;
        info!("[ups_lite] Empty battery (<= {}%): shutting down", self.threshold);
        surface.update(true, &[(STATUS_KEY, SHUTDOWN_MESSAGE)]);
        if let Err(e) = trigger.shutdown() {
            error!("[ups_lite] shutdown request failed: {}", e);
        }

        self.state
    }
}
