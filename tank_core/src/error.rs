use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TankError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    /// Distance outside (0, tank height]; includes the echo-timeout sentinel.
    #[error("invalid sensor reading: {distance_cm:.1} cm")]
    SensorInvalid { distance_cm: f32 },
    #[error("timeout waiting for echo")]
    Timeout,
    #[error("notification transport failed: {0}")]
    Transport(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
