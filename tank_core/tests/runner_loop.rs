use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tank_core::mocks::{FixedWallClock, RecordingActuator, ScriptedRanger};
use tank_core::{ControlLoop, LoopCfg, Mailbox, PumpStatus, SharedTank, TankStatus};
use tank_traits::clock::test_clock::TestClock;

fn build(
    ranger: ScriptedRanger,
    actuator: RecordingActuator,
    clock: &TestClock,
) -> (ControlLoop<ScriptedRanger, RecordingActuator, FixedWallClock>, SharedTank) {
    let shared = SharedTank::new();
    let ctl = ControlLoop::new(
        ranger,
        actuator,
        FixedWallClock::new("09:00:00"),
        shared.clone(),
        Mailbox::new(),
        LoopCfg::default(),
        Arc::new(clock.clone()),
    )
    .expect("valid config");
    (ctl, shared)
}

#[test]
fn runs_requested_cycles_at_cadence() {
    let clock = TestClock::new();
    let (mut ctl, shared) = build(ScriptedRanger::constant_cm(5.0), RecordingActuator::new(), &clock);
    ctl.boot().expect("boot");
    let stop = AtomicBool::new(false);

    let cycles = ctl.run(&stop, Some(3)).expect("run");
    assert_eq!(cycles, 3);
    assert_eq!(shared.snapshot().tank, TankStatus::Normal);

    // Four 10 ms gaps per reading, plus the ticker waiting out the rest of
    // each 100 ms period after the first.
    let gap = Duration::from_millis(10);
    let sleeps = clock.sleeps();
    assert_eq!(sleeps.iter().filter(|d| **d == gap).count(), 12);
    assert_eq!(
        sleeps.iter().filter(|d| **d == Duration::from_millis(60)).count(),
        2
    );
}

#[test]
fn raised_stop_flag_runs_nothing_and_parks_relay() {
    let clock = TestClock::new();
    let actuator = RecordingActuator::new();
    let (mut ctl, _shared) = build(ScriptedRanger::constant_cm(5.0), actuator.clone(), &clock);
    let stop = AtomicBool::new(true);
    assert_eq!(ctl.run(&stop, None).expect("run"), 0);
    assert_eq!(actuator.relay_calls(), vec![false]);
}

#[test]
fn silent_sensor_publishes_nothing() {
    let clock = TestClock::new();
    let (mut ctl, shared) = build(ScriptedRanger::silent(), RecordingActuator::new(), &clock);
    ctl.boot().expect("boot");
    let before = shared.snapshot();
    ctl.run(&AtomicBool::new(false), Some(5)).expect("run");
    assert_eq!(shared.snapshot(), before);
}

#[test]
fn draining_tank_triggers_refill_cycle() {
    let clock = TestClock::new();
    let ranger = ScriptedRanger::constant_cm(9.5);
    let actuator = RecordingActuator::new();
    let (mut ctl, shared) = build(ranger.clone(), actuator.clone(), &clock);
    ctl.boot().expect("boot");

    ctl.step().expect("cycle");
    assert_eq!(ctl.pump(), PumpStatus::On);
    assert!(actuator.relay_energized());

    // EMA needs a few cycles to climb past 80 %.
    ranger.set_constant_cm(Some(1.0));
    for _ in 0..20 {
        ctl.step().expect("cycle");
    }
    let snap = shared.snapshot();
    assert_eq!(snap.tank, TankStatus::Full);
    assert_eq!(snap.monthly_fills, 1);
    assert_eq!(snap.last_filled_or_placeholder(), "09:00:00");
    assert!(!actuator.relay_energized());
}

#[test]
fn failing_cycles_do_not_stop_the_loop() {
    let clock = TestClock::new();
    let actuator = RecordingActuator::new();
    let (mut ctl, _shared) = build(ScriptedRanger::constant_cm(9.5), actuator.clone(), &clock);
    actuator.set_fail_relay(true);
    let err = ctl.run(&AtomicBool::new(false), Some(4)).unwrap_err();
    // Every cycle failed to switch the relay; so did the final park.
    assert!(format!("{err:#}").contains("shutdown"));
    assert_eq!(ctl.pump(), PumpStatus::Off);
}
