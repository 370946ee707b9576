//! Hysteresis pump controller.
//!
//! `decide` is pure: it maps the current level onto the next pump/tank state
//! and the event (if any) that transition produces. The caller drives the
//! relay and only then calls `apply`, so a failed relay write leaves the
//! controller where the hardware actually is and the same decision is made
//! again on the next cycle.
use crate::config::ControlCfg;
use crate::status::{PumpStatus, TankStatus};

/// Side-effecting transitions. Steady-state refreshes produce none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    PumpStarted,
    TankFull,
}

impl ControlEvent {
    /// Event log text.
    pub const fn action(self) -> &'static str {
        match self {
            Self::PumpStarted => "Pump ON (low level)",
            Self::TankFull => "Tank FULL, pump OFF",
        }
    }

    /// Alert text.
    pub const fn notification(self) -> &'static str {
        match self {
            Self::PumpStarted => "FILLING STARTED",
            Self::TankFull => "TANK FULL",
        }
    }

    /// Whether the fill buzzer sounds for this event.
    pub const fn beeps(self) -> bool {
        matches!(self, Self::TankFull)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub pump: PumpStatus,
    pub tank: TankStatus,
    pub event: Option<ControlEvent>,
    /// The relay must be switched to match `pump`.
    pub relay_edge: bool,
}

#[derive(Debug, Clone)]
pub struct PumpController {
    low_pct: f32,
    high_pct: f32,
    pump: PumpStatus,
    tank: TankStatus,
    counted: bool,
    monthly_fills: u32,
}

impl PumpController {
    pub fn new(cfg: &ControlCfg) -> Self {
        Self {
            low_pct: cfg.low_pct,
            high_pct: cfg.high_pct,
            pump: PumpStatus::Off,
            tank: TankStatus::Unknown,
            counted: false,
            monthly_fills: 0,
        }
    }

    /// Evaluate the rules in precedence order for a valid level.
    pub fn decide(&self, level_pct: f32) -> Decision {
        let keep = |pump, tank| Decision {
            pump,
            tank,
            event: None,
            relay_edge: false,
        };
        match self.pump {
            PumpStatus::Off if level_pct <= self.low_pct => Decision {
                pump: PumpStatus::On,
                tank: TankStatus::Filling,
                event: Some(ControlEvent::PumpStarted),
                relay_edge: true,
            },
            PumpStatus::On if level_pct >= self.high_pct => Decision {
                pump: PumpStatus::Off,
                tank: TankStatus::Full,
                event: (!self.counted).then_some(ControlEvent::TankFull),
                relay_edge: true,
            },
            PumpStatus::On => keep(PumpStatus::On, TankStatus::Filling),
            PumpStatus::Off if level_pct < self.high_pct => keep(PumpStatus::Off, TankStatus::Normal),
            // OFF at or above HIGH: a completed fill stays FULL.
            PumpStatus::Off => keep(PumpStatus::Off, self.tank),
        }
    }

    /// Commit a decision once its actuation has succeeded.
    pub fn apply(&mut self, d: &Decision) {
        self.pump = d.pump;
        self.tank = d.tank;
        match d.event {
            Some(ControlEvent::PumpStarted) => self.counted = false,
            Some(ControlEvent::TankFull) => {
                self.counted = true;
                self.monthly_fills = self.monthly_fills.saturating_add(1);
            }
            None => {}
        }
    }

    pub fn pump(&self) -> PumpStatus {
        self.pump
    }

    pub fn tank(&self) -> TankStatus {
        self.tank
    }

    pub fn monthly_fills(&self) -> u32 {
        self.monthly_fills
    }

    pub fn already_counted(&self) -> bool {
        self.counted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctl() -> PumpController {
        PumpController::new(&ControlCfg::default())
    }

    fn step(c: &mut PumpController, level: f32) -> Decision {
        let d = c.decide(level);
        c.apply(&d);
        d
    }

    #[test]
    fn starts_off_and_unknown() {
        let c = ctl();
        assert_eq!(c.pump(), PumpStatus::Off);
        assert_eq!(c.tank(), TankStatus::Unknown);
        assert_eq!(c.monthly_fills(), 0);
    }

    #[rstest]
    #[case(PumpStatus::Off, 20.0, PumpStatus::On, TankStatus::Filling)]
    #[case(PumpStatus::Off, 50.0, PumpStatus::Off, TankStatus::Normal)]
    #[case(PumpStatus::On, 79.9, PumpStatus::On, TankStatus::Filling)]
    #[case(PumpStatus::On, 80.0, PumpStatus::Off, TankStatus::Full)]
    fn rule_table(
        #[case] pump: PumpStatus,
        #[case] level: f32,
        #[case] want_pump: PumpStatus,
        #[case] want_tank: TankStatus,
    ) {
        let mut c = ctl();
        if pump.is_on() {
            step(&mut c, 10.0);
        }
        let d = c.decide(level);
        assert_eq!((d.pump, d.tank), (want_pump, want_tank));
    }

    #[test]
    fn decide_does_not_mutate() {
        let c = ctl();
        let d = c.decide(5.0);
        assert_eq!(d.event, Some(ControlEvent::PumpStarted));
        assert_eq!(c.pump(), PumpStatus::Off);
        assert_eq!(c.decide(5.0), d);
    }

    #[test]
    fn low_level_while_on_does_not_refire() {
        let mut c = ctl();
        assert_eq!(step(&mut c, 15.0).event, Some(ControlEvent::PumpStarted));
        let again = step(&mut c, 15.0);
        assert_eq!(again.event, None);
        assert!(!again.relay_edge);
    }

    #[test]
    fn full_counts_once_and_stays_full() {
        let mut c = ctl();
        step(&mut c, 10.0);
        let d = step(&mut c, 85.0);
        assert_eq!(d.event, Some(ControlEvent::TankFull));
        assert!(c.already_counted());
        for _ in 0..10 {
            let d = step(&mut c, 95.0);
            assert_eq!(d.event, None);
            assert_eq!(d.tank, TankStatus::Full);
        }
        assert_eq!(c.monthly_fills(), 1);
    }

    #[test]
    fn pump_start_rearms_counter() {
        let mut c = ctl();
        step(&mut c, 10.0);
        step(&mut c, 90.0);
        step(&mut c, 10.0);
        assert!(!c.already_counted());
        step(&mut c, 90.0);
        assert_eq!(c.monthly_fills(), 2);
    }
}
