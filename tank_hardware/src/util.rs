use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Busy-poll `level()` until it differs from `while_level`, or fail with
/// `EchoTimeout` once `timeout` has elapsed. Returns the time spent waiting.
///
/// Echo pulses are tens of microseconds to a few milliseconds long, so this
/// spins instead of sleeping; `poll_interval` of zero means a pure spin.
pub fn wait_while_level(
    mut level: impl FnMut() -> bool,
    while_level: bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;
    while level() == while_level {
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(start.elapsed())
}
