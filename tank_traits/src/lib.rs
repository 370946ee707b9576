pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// Speed of sound at room temperature, in centimetres per microsecond.
pub const SOUND_CM_PER_US: f32 = 0.0343;

/// Error type carried across every collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Ultrasonic ranging front end (trigger + echo lines).
pub trait Ranger {
    /// Fire one trigger pulse.
    fn emit_pulse(&mut self) -> Result<(), BoxError>;
    /// Wait for the echo of the last pulse. `Ok(None)` means no echo arrived
    /// within `timeout`.
    fn measure_echo(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError>;
}

/// Pump relay and buzzer outputs.
pub trait Actuator {
    fn set_relay(&mut self, energized: bool) -> Result<(), BoxError>;
    fn set_buzzer(&mut self, on: bool) -> Result<(), BoxError>;
}

/// Human-readable wall time used to stamp log entries and fills.
pub trait WallClock {
    fn formatted_time(&self) -> String;
}

/// Outbound alert delivery.
pub trait MailTransport {
    fn send(&mut self, recipient: &str, subject: &str, body: &str) -> Result<(), BoxError>;
}

impl<T: Ranger + ?Sized> Ranger for Box<T> {
    fn emit_pulse(&mut self) -> Result<(), BoxError> {
        (**self).emit_pulse()
    }

    fn measure_echo(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError> {
        (**self).measure_echo(timeout)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_relay(&mut self, energized: bool) -> Result<(), BoxError> {
        (**self).set_relay(energized)
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), BoxError> {
        (**self).set_buzzer(on)
    }
}
