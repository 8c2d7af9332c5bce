use super::fakes::{raw_for_capacity, CountingTrigger, FakeChannel, RecordingSurface, Registers};
use crate::bus::BusError;
use crate::controller::{
    format_capacity, format_capacity_with_voltage, PollState, PollingController,
    SHUTDOWN_MESSAGE, STATUS_KEY,
};
use crate::telemetry::{byte_swap16, TelemetryReader, REGISTER_CAPACITY, REGISTER_VOLTAGE};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn setup(capacity_raw: Result<u16, BusError>) -> (Registers, TelemetryReader<FakeChannel>) {
    let regs: Registers = Rc::new(RefCell::new(HashMap::new()));
    regs.borrow_mut().insert(REGISTER_CAPACITY, capacity_raw);
    let reader = TelemetryReader::new(FakeChannel::new(&regs));
    (regs, reader)
}

#[test]
fn formats_integer_percentages() {
    assert_eq!(format_capacity(41.9), "41%");
    assert_eq!(format_capacity(0.0), "0%");
    assert_eq!(format_capacity(100.0), "100%");
    assert_eq!(format_capacity(0.3125), "0%");
    assert_eq!(format_capacity_with_voltage(55.5, 4.1), "55%/4.1V");
}

#[test]
fn threshold_is_inclusive() {
    let controller = PollingController::new(20.0, "ups");
    let just_above = f32::from_bits(20.0f32.to_bits() + 1);

    assert!(controller.should_shutdown(20.0));
    assert!(controller.should_shutdown(0.0));
    assert!(!controller.should_shutdown(just_above));
    assert!(!controller.should_shutdown(20.00390625));
}

#[test]
fn capacity_at_threshold_triggers_shutdown() {
    let (_regs, mut reader) = setup(Ok(raw_for_capacity(20)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups");

    let state = controller.tick(&mut reader, &mut surface, &mut trigger);
    assert_eq!(state, PollState::ShuttingDown);
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn capacity_above_threshold_returns_to_idle() {
    // 20 + 1/256, the smallest step the gauge can report
    let (_regs, mut reader) = setup(Ok(byte_swap16(20 * 256 + 1)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups");

    let state = controller.tick(&mut reader, &mut surface, &mut trigger);
    assert_eq!(state, PollState::Idle);
    assert_eq!(controller.state(), PollState::Idle);
    assert_eq!(surface.last_value("ups"), Some("20%"));
    assert!(surface.updates.is_empty());
    assert_eq!(trigger.calls.get(), 0);
}

#[test]
fn draining_battery_shuts_down_once() {
    let (regs, mut reader) = setup(Ok(raw_for_capacity(55)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups");

    assert_eq!(controller.tick(&mut reader, &mut surface, &mut trigger), PollState::Idle);
    assert_eq!(surface.last_value("ups"), Some("55%"));
    assert_eq!(trigger.calls.get(), 0);
    assert!(surface.updates.is_empty());

    regs.borrow_mut().insert(REGISTER_CAPACITY, Ok(raw_for_capacity(15)));
    assert_eq!(
        controller.tick(&mut reader, &mut surface, &mut trigger),
        PollState::ShuttingDown
    );
    assert_eq!(surface.last_value("ups"), Some("15%"));
    assert_eq!(
        surface.updates,
        vec![(true, vec![(STATUS_KEY.to_string(), SHUTDOWN_MESSAGE.to_string())])]
    );
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn sensor_fault_shuts_down() {
    let (_regs, mut reader) = setup(Err(BusError::HardwareError("device absent".to_string())));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups");

    let state = controller.tick(&mut reader, &mut surface, &mut trigger);
    assert_eq!(state, PollState::ShuttingDown);
    assert_eq!(surface.last_value("ups"), Some("0%"));
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn shutdown_is_latched() {
    let (regs, mut reader) = setup(Ok(raw_for_capacity(5)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups");

    controller.tick(&mut reader, &mut surface, &mut trigger);
    let values_after_first = surface.values.len();

    // the host has not powered off yet and keeps ticking, even with a recovered reading
    regs.borrow_mut().insert(REGISTER_CAPACITY, Ok(raw_for_capacity(90)));
    for _ in 0..3 {
        assert_eq!(
            controller.tick(&mut reader, &mut surface, &mut trigger),
            PollState::ShuttingDown
        );
    }

    assert_eq!(trigger.calls.get(), 1);
    assert_eq!(surface.values.len(), values_after_first);
    assert_eq!(surface.updates.len(), 1);
}

#[test]
fn failed_shutdown_request_is_swallowed() {
    let (_regs, mut reader) = setup(Ok(raw_for_capacity(3)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    trigger.fail = true;
    let mut controller = PollingController::new(20.0, "ups");

    let state = controller.tick(&mut reader, &mut surface, &mut trigger);
    assert_eq!(state, PollState::ShuttingDown);
    assert_eq!(trigger.calls.get(), 1);
}

#[test]
fn shows_voltage_when_enabled() {
    let (regs, mut reader) = setup(Ok(raw_for_capacity(55)));
    // 52480 * 1.25 / 1000 / 16 = 4.1V
    regs.borrow_mut().insert(REGISTER_VOLTAGE, Ok(byte_swap16(52480)));
    let mut surface = RecordingSurface::new(250);
    let mut trigger = CountingTrigger::new();
    let mut controller = PollingController::new(20.0, "ups").with_voltage(true);

    controller.tick(&mut reader, &mut surface, &mut trigger);
    assert_eq!(surface.last_value("ups"), Some("55%/4.1V"));
}
