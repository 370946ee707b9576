//! Scripted collaborators for tests and dry runs.
//!
//! Each mock is `Clone` and shares its state, so a test can keep a handle
//! after moving a copy into the control loop.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tank_traits::{Actuator, BoxError, MailTransport, Ranger, SOUND_CM_PER_US, WallClock};

/// Round-trip echo width for a one-way distance.
pub fn cm_to_echo(cm: f32) -> Duration {
    Duration::from_secs_f32(cm.max(0.0) * 2.0 / SOUND_CM_PER_US / 1_000_000.0)
}

/// Ranger replaying a script of distances; `None` entries time out.
///
/// The script wraps around, so a one-element script is a constant sensor.
#[derive(Debug, Clone)]
pub struct ScriptedRanger {
    script: Arc<Mutex<Vec<Option<f32>>>>,
    pos: usize,
}

impl ScriptedRanger {
    pub fn new(script: Vec<Option<f32>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            pos: 0,
        }
    }

    pub fn constant_cm(cm: f32) -> Self {
        Self::new(vec![Some(cm)])
    }

    pub fn from_cm(cms: &[f32]) -> Self {
        Self::new(cms.iter().copied().map(Some).collect())
    }

    /// Every echo times out.
    pub fn silent() -> Self {
        Self::new(vec![None])
    }

    /// Replace the script on every clone.
    pub fn set_constant_cm(&self, cm: Option<f32>) {
        if let Ok(mut s) = self.script.lock() {
            *s = vec![cm];
        }
    }
}

impl Ranger for ScriptedRanger {
    fn emit_pulse(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn measure_echo(&mut self, _timeout: Duration) -> Result<Option<Duration>, BoxError> {
        let script = self
            .script
            .lock()
            .map_err(|_| BoxError::from("ranger script poisoned"))?;
        if script.is_empty() {
            return Ok(None);
        }
        let next = script[self.pos % script.len()];
        self.pos = self.pos.wrapping_add(1);
        Ok(next.map(cm_to_echo))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Relay(bool),
    Buzzer(bool),
}

/// Actuator recording every call; the relay can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,
    fail_relay: Arc<Mutex<bool>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn relay_calls(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ActuatorCall::Relay(on) => Some(on),
                ActuatorCall::Buzzer(_) => None,
            })
            .collect()
    }

    /// Last commanded relay state; de-energized if never driven.
    pub fn relay_energized(&self) -> bool {
        self.relay_calls().last().copied().unwrap_or(false)
    }

    pub fn set_fail_relay(&self, fail: bool) {
        if let Ok(mut f) = self.fail_relay.lock() {
            *f = fail;
        }
    }

    fn record(&self, call: ActuatorCall) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }
}

impl Actuator for RecordingActuator {
    fn set_relay(&mut self, energized: bool) -> Result<(), BoxError> {
        if self.fail_relay.lock().map(|f| *f).unwrap_or(false) {
            return Err(Box::new(std::io::Error::other("relay driver fault")));
        }
        self.record(ActuatorCall::Relay(energized));
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), BoxError> {
        self.record(ActuatorCall::Buzzer(on));
        Ok(())
    }
}

/// Wall clock frozen at a settable time string.
#[derive(Debug, Clone)]
pub struct FixedWallClock {
    now: Arc<Mutex<String>>,
}

impl FixedWallClock {
    pub fn new(now: &str) -> Self {
        Self {
            now: Arc::new(Mutex::new(now.to_string())),
        }
    }

    pub fn set(&self, now: &str) {
        if let Ok(mut t) = self.now.lock() {
            *t = now.to_string();
        }
    }
}

impl WallClock for FixedWallClock {
    fn formatted_time(&self) -> String {
        self.now.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Transport keeping sent mail in memory; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMail>>>,
    failure: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), BoxError> {
        if let Some(reason) = &self.failure {
            return Err(BoxError::from(reason.clone()));
        }
        if let Ok(mut s) = self.sent.lock() {
            s.push(SentMail {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::echo_to_cm;

    #[test]
    fn echo_helpers_are_inverse() {
        let d = echo_to_cm(cm_to_echo(42.0));
        assert!((d - 42.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn script_wraps_and_shares_state() {
        let mut r = ScriptedRanger::new(vec![Some(5.0), None]);
        let handle = r.clone();
        assert!(r.measure_echo(Duration::ZERO).expect("ok").is_some());
        assert!(r.measure_echo(Duration::ZERO).expect("ok").is_none());
        handle.set_constant_cm(None);
        assert!(r.measure_echo(Duration::ZERO).expect("ok").is_none());
    }

    #[test]
    fn failing_relay_is_not_recorded() {
        let mut a = RecordingActuator::new();
        a.set_fail_relay(true);
        assert!(a.set_relay(true).is_err());
        assert!(a.relay_calls().is_empty());
    }
}
