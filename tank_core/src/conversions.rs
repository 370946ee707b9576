//! `From` implementations bridging `tank_config` types to `tank_core` types.

use crate::config::{ControlCfg, LevelCfg, LoopCfg, NotifyCfg, SamplerCfg};

impl From<&tank_config::SamplerCfg> for SamplerCfg {
    fn from(c: &tank_config::SamplerCfg) -> Self {
        Self {
            samples: c.samples,
            echo_timeout_ms: c.echo_timeout_ms,
            sample_gap_ms: c.sample_gap_ms,
        }
    }
}

impl From<&tank_config::ControlCfg> for ControlCfg {
    fn from(c: &tank_config::ControlCfg) -> Self {
        Self {
            low_pct: c.low_pct,
            high_pct: c.high_pct,
            cadence_ms: c.cadence_ms,
            buzzer_pulse_ms: c.buzzer_pulse_ms,
        }
    }
}

impl From<&tank_config::NotifyCfg> for NotifyCfg {
    fn from(c: &tank_config::NotifyCfg) -> Self {
        Self {
            recipient: c.recipient.clone(),
            subject: c.subject.clone(),
            poll_ms: c.poll_ms,
        }
    }
}

/// Level settings span two TOML sections.
impl From<&tank_config::Config> for LevelCfg {
    fn from(c: &tank_config::Config) -> Self {
        Self {
            height_cm: c.tank.height_cm,
            ema_alpha: c.filter.ema_alpha,
        }
    }
}

impl From<&tank_config::Config> for LoopCfg {
    fn from(c: &tank_config::Config) -> Self {
        Self {
            sampler: (&c.sampler).into(),
            level: c.into(),
            control: (&c.control).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_toml_sections_onto_runtime_structs() {
        let cfg = tank_config::load_toml(
            r#"
[pins]
trig = 5
echo = 18
relay = 23
buzzer = 19

[tank]
height_cm = 120.0

[control]
low_pct = 25.0
high_pct = 90.0

[filter]
ema_alpha = 0.5
"#,
        )
        .expect("parse");
        let level = LevelCfg::from(&cfg);
        assert_eq!(level.height_cm, 120.0);
        assert_eq!(level.ema_alpha, 0.5);
        let control = ControlCfg::from(&cfg.control);
        assert_eq!((control.low_pct, control.high_pct), (25.0, 90.0));
        let sampler = SamplerCfg::from(&cfg.sampler);
        assert_eq!(sampler.samples, 5);
        let looped = LoopCfg::from(&cfg);
        assert_eq!(looped.cadence(), std::time::Duration::from_millis(100));
        let notify = NotifyCfg::from(&cfg.notify);
        assert_eq!(notify.subject, "Smart Tank");
    }
}
