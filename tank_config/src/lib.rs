#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tank controller.
//!
//! `Config` and its sections are deserialized from TOML, then checked with
//! `Config::validate`. Only `[pins]` and `[tank]` are mandatory; every other
//! section falls back to the firmware defaults.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// Ultrasonic trigger output.
    pub trig: u8,
    /// Ultrasonic echo input.
    pub echo: u8,
    /// Pump relay output.
    pub relay: u8,
    /// Buzzer output.
    pub buzzer: u8,
    /// Most relay boards switch on a low input.
    #[serde(default = "default_true")]
    pub relay_active_low: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TankCfg {
    /// Distance from the transducer to the tank floor, cm.
    pub height_cm: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Pump starts at or below this level (percent).
    pub low_pct: f32,
    /// Pump stops at or above this level (percent).
    pub high_pct: f32,
    /// Control loop period.
    pub cadence_ms: u64,
    /// Buzzer beep length on a completed fill.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerCfg {
    /// Pings per reading; the median is kept. Must be odd.
    pub samples: usize,
    /// Max wait for one echo.
    pub echo_timeout_ms: u64,
    /// Pause between pings so stray echoes die out.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Weight of the newest reading in the level EMA, (0.0, 1.0].
    pub ema_alpha: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { ema_alpha: 0.3 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifyCfg {
    pub enabled: bool,
    pub recipient: String,
    pub subject: String,
    /// How often the dispatcher checks for a pending alert.
    pub poll_ms: u64,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            recipient: String::new(),
            subject: "Smart Tank".to_string(),
            poll_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpCfg {
    pub bind: String,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TimeCfg {
    /// Offset applied to UTC when stamping log entries.
    pub utc_offset_secs: i32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    pub tank: TankCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub sampler: SamplerCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub notify: NotifyCfg,
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub time: TimeCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Tank
        if !(self.tank.height_cm.is_finite() && self.tank.height_cm > 0.0) {
            eyre::bail!("tank.height_cm must be > 0");
        }
        if self.tank.height_cm > 1000.0 {
            eyre::bail!("tank.height_cm is beyond ultrasonic range (>1000 cm)");
        }

        // Control
        let c = &self.control;
        if !(0.0..=100.0).contains(&c.low_pct) {
            eyre::bail!("control.low_pct must be in [0, 100]");
        }
        if !(0.0..=100.0).contains(&c.high_pct) {
            eyre::bail!("control.high_pct must be in [0, 100]");
        }
        if c.low_pct >= c.high_pct {
            eyre::bail!("control.low_pct must be below control.high_pct");
        }
        if c.cadence_ms == 0 {
            eyre::bail!("control.cadence_ms must be >= 1");
        }
        if c.buzzer_pulse_ms > 10_000 {
            eyre::bail!("control.buzzer_pulse_ms is unreasonably large (>10s)");
        }

        // Sampler
        let s = &self.sampler;
        if s.samples == 0 || s.samples % 2 == 0 {
            eyre::bail!("sampler.samples must be odd and >= 1");
        }
        if s.samples > 15 {
            eyre::bail!("sampler.samples must be <= 15");
        }
        if s.echo_timeout_ms == 0 {
            eyre::bail!("sampler.echo_timeout_ms must be >= 1");
        }
        if s.echo_timeout_ms > 100 {
            eyre::bail!("sampler.echo_timeout_ms must be <= 100");
        }

        // Filter
        let alpha = self.filter.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            eyre::bail!("filter.ema_alpha must be in (0.0, 1.0]");
        }

        // Notify
        if self.notify.enabled && !self.notify.recipient.contains('@') {
            eyre::bail!("notify.recipient must be an email address when notify.enabled");
        }
        if self.notify.poll_ms == 0 {
            eyre::bail!("notify.poll_ms must be >= 1");
        }

        // Http
        if self.http.bind.parse::<std::net::SocketAddr>().is_err() {
            eyre::bail!("http.bind must be host:port, got {:?}", self.http.bind);
        }

        // Time
        if self.time.utc_offset_secs.abs() >= 24 * 3600 {
            eyre::bail!("time.utc_offset_secs must be within +/-24h");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be never, daily or hourly");
        }

        Ok(())
    }
}
