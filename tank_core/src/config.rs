//! Runtime configuration for the control loop.
//!
//! These are the structs the engine consumes. They are separate from the
//! TOML-deserialized config in `tank_config`; see `conversions`.
use std::time::Duration;

/// Ultrasonic sampling.
#[derive(Debug, Clone)]
pub struct SamplerCfg {
    /// Pings per reading; the median is kept.
    pub samples: usize,
    /// Max wait per echo (ms).
    pub echo_timeout_ms: u64,
    /// Pause between pings (ms).
    pub sample_gap_ms: u64,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            samples: 5,
            echo_timeout_ms: 20,
            sample_gap_ms: 10,
        }
    }
}

impl SamplerCfg {
    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    pub fn sample_gap(&self) -> Duration {
        Duration::from_millis(self.sample_gap_ms)
    }

    /// Upper bound on one `DistanceSampler::sample` call.
    pub fn worst_case(&self) -> Duration {
        (self.echo_timeout() + self.sample_gap()) * self.samples.max(1) as u32
    }
}

/// Distance-to-level conversion and smoothing.
#[derive(Debug, Clone)]
pub struct LevelCfg {
    /// Transducer-to-floor distance (cm).
    pub height_cm: f32,
    /// EMA weight of the newest reading, (0.0, 1.0].
    pub ema_alpha: f32,
}

impl Default for LevelCfg {
    fn default() -> Self {
        Self {
            height_cm: 10.0,
            ema_alpha: 0.3,
        }
    }
}

/// Hysteresis band and loop pacing.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Pump ON at or below this level (%).
    pub low_pct: f32,
    /// Pump OFF at or above this level (%).
    pub high_pct: f32,
    /// Control loop period (ms).
    pub cadence_ms: u64,
    /// Buzzer beep on a completed fill (ms).
    pub buzzer_pulse_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            low_pct: 20.0,
            high_pct: 80.0,
            cadence_ms: 100,
            buzzer_pulse_ms: 500,
        }
    }
}

/// Alert delivery.
#[derive(Debug, Clone)]
pub struct NotifyCfg {
    pub recipient: String,
    pub subject: String,
    /// Dispatcher poll interval (ms).
    pub poll_ms: u64,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            subject: "Smart Tank".to_string(),
            poll_ms: 200,
        }
    }
}

/// Everything `ControlLoop::new` needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct LoopCfg {
    pub sampler: SamplerCfg,
    pub level: LevelCfg,
    pub control: ControlCfg,
}

impl LoopCfg {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.control.cadence_ms.max(1))
    }

    pub fn buzzer_pulse(&self) -> Duration {
        Duration::from_millis(self.control.buzzer_pulse_ms)
    }
}
