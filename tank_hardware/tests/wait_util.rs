use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tank_hardware::error::HwError;
use tank_hardware::util::wait_while_level;

#[test]
fn echo_edge_observed_before_timeout() {
    let high = Arc::new(AtomicBool::new(false));
    let high_bg = high.clone();
    // Rising edge after a short delay
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        high_bg.store(true, Ordering::Relaxed);
    });

    let waited = wait_while_level(
        || high.load(Ordering::Relaxed),
        false,
        Duration::from_millis(200),
        Duration::from_micros(100),
    )
    .expect("edge before timeout");
    assert!(waited >= Duration::from_millis(2), "waited {waited:?}");
}

#[test]
fn stuck_line_times_out() {
    let high = Arc::new(AtomicBool::new(true));

    let err = wait_while_level(
        || high.load(Ordering::Relaxed),
        true,
        Duration::from_millis(5),
        Duration::ZERO,
    )
    .expect_err("expected timeout error");

    match err {
        HwError::EchoTimeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn already_settled_line_returns_immediately() {
    let waited = wait_while_level(
        || false,
        true,
        Duration::from_millis(5),
        Duration::ZERO,
    )
    .expect("no wait needed");
    assert!(waited < Duration::from_millis(5));
}
