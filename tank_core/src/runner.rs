//! The periodic sense → decide → actuate → publish loop.
//!
//! Per cycle: take a median distance, fold it into the level estimate, let
//! the controller decide, drive the relay on pump edges, then commit level,
//! statuses, fill stamp and log entry to `SharedTank` in one critical
//! section and finally post the alert. No lock is held across hardware I/O.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use tank_traits::{Actuator, Clock, Ranger, WallClock};

use crate::config::LoopCfg;
use crate::controller::{ControlEvent, Decision, PumpController};
use crate::error::{Report, Result, TankError};
use crate::event_log::LogEntry;
use crate::hw_error::map_hw_error;
use crate::level::LevelEstimator;
use crate::notify::Mailbox;
use crate::sampler::DistanceSampler;
use crate::status::{PumpStatus, TankStatus};
use crate::telemetry::SharedTank;
use crate::util::Ticker;

/// Log entry written once at start-up.
pub const BOOT_ACTION: &str = "System boot";

/// Result of one control cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Reading rejected; nothing was published.
    Skipped(TankError),
    /// Level and statuses refreshed, no transition.
    Steady,
    Changed(ControlEvent),
}

pub struct ControlLoop<R: Ranger, A: Actuator, W: WallClock> {
    sampler: DistanceSampler<R>,
    actuator: A,
    wall: W,
    estimator: LevelEstimator,
    controller: PumpController,
    shared: SharedTank,
    mailbox: Mailbox,
    clock: Arc<dyn Clock + Send + Sync>,
    cfg: LoopCfg,
}

impl<R: Ranger, A: Actuator, W: WallClock> core::fmt::Debug for ControlLoop<R, A, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("estimator", &self.estimator)
            .field("controller", &self.controller)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

fn invalid(msg: &str) -> Report {
    Report::new(TankError::Config(msg.to_string()))
}

impl<R: Ranger, A: Actuator, W: WallClock> ControlLoop<R, A, W> {
    pub fn new(
        ranger: R,
        actuator: A,
        wall: W,
        shared: SharedTank,
        mailbox: Mailbox,
        cfg: LoopCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        let height = cfg.level.height_cm;
        if !(height.is_finite() && height > 0.0) {
            return Err(invalid("tank height must be > 0"));
        }
        let band_ok = cfg.control.low_pct < cfg.control.high_pct;
        if !band_ok {
            return Err(invalid("low threshold must be below high threshold"));
        }
        let alpha = cfg.level.ema_alpha;
        let alpha_ok = alpha > 0.0 && alpha <= 1.0;
        if !alpha_ok {
            return Err(invalid("EMA alpha must be in (0, 1]"));
        }
        if cfg.sampler.samples == 0 || cfg.sampler.samples % 2 == 0 {
            return Err(invalid("sample count must be odd"));
        }
        Ok(Self {
            sampler: DistanceSampler::new(ranger, cfg.sampler.clone(), clock.clone()),
            actuator,
            wall,
            estimator: LevelEstimator::new(alpha),
            controller: PumpController::new(&cfg.control),
            shared,
            mailbox,
            clock,
            cfg,
        })
    }

    /// Put the outputs in their safe state and write the boot log entry.
    pub fn boot(&mut self) -> Result<()> {
        self.actuator
            .set_relay(false)
            .map_err(|e| map_hw_error(e.as_ref()))
            .wrap_err("de-energizing pump relay at boot")?;
        self.actuator
            .set_buzzer(false)
            .map_err(|e| map_hw_error(e.as_ref()))
            .wrap_err("silencing buzzer at boot")?;
        let now = self.wall.formatted_time();
        self.shared.append_event(LogEntry::new(&now, BOOT_ACTION));
        tracing::info!(at = %now, "system boot");
        Ok(())
    }

    /// One full cycle including the sensor read.
    pub fn step(&mut self) -> Result<CycleOutcome> {
        let distance = self.sampler.sample();
        self.step_from_distance(distance)
    }

    /// One cycle from an externally measured distance.
    pub fn step_from_distance(&mut self, distance_cm: f32) -> Result<CycleOutcome> {
        match self.estimator.update(distance_cm, self.cfg.level.height_cm) {
            Ok(level) => self.apply_level(level),
            Err(e) => {
                tracing::warn!(distance_cm, "sensor reading rejected, cycle skipped");
                Ok(CycleOutcome::Skipped(e))
            }
        }
    }

    /// Evaluate, actuate and publish for an already smoothed level.
    pub fn apply_level(&mut self, level_pct: f32) -> Result<CycleOutcome> {
        let decision = self.controller.decide(level_pct);
        tracing::debug!(
            level_pct,
            pump = %decision.pump,
            tank = %decision.tank,
            "control cycle"
        );

        if decision.relay_edge {
            self.actuator
                .set_relay(decision.pump.is_on())
                .map_err(|e| map_hw_error(e.as_ref()))
                .wrap_err("switching pump relay")?;
        }
        let beeping = decision.event.is_some_and(ControlEvent::beeps) && self.buzzer_on();
        self.controller.apply(&decision);

        let stamp = decision.event.map(|_| self.wall.formatted_time());
        let monthly = self.controller.monthly_fills();
        self.shared.update(|st| {
            st.set_level(level_pct);
            st.set_status(decision.tank, decision.pump);
            if let (Some(event), Some(at)) = (decision.event, &stamp) {
                if event == ControlEvent::TankFull {
                    st.record_fill(at.clone(), monthly);
                }
                st.append(LogEntry::new(at, event.action()));
            }
        });

        let Some(event) = decision.event else {
            return Ok(CycleOutcome::Steady);
        };
        tracing::info!(level_pct, event = event.action(), monthly, "pump transition");
        if self.mailbox.post(event.notification()) {
            tracing::debug!("undelivered notification replaced");
        }
        // Pulse only after the commit: a published pump ON implies an energized relay.
        if beeping {
            self.clock.sleep(self.cfg.buzzer_pulse());
            self.buzzer_off();
        }
        Ok(CycleOutcome::Changed(event))
    }

    fn buzzer_on(&mut self) -> bool {
        match self.actuator.set_buzzer(true) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %map_hw_error(e.as_ref()), "buzzer on failed");
                false
            }
        }
    }

    fn buzzer_off(&mut self) {
        if let Err(e) = self.actuator.set_buzzer(false) {
            tracing::warn!(error = %map_hw_error(e.as_ref()), "buzzer off failed");
        }
    }

    /// De-energize the relay and publish the pump as OFF.
    ///
    /// An interrupted fill is published as `NORMAL`.
    pub fn shutdown(&mut self) -> Result<()> {
        self.actuator
            .set_relay(false)
            .map_err(|e| map_hw_error(e.as_ref()))
            .wrap_err("de-energizing pump relay at shutdown")?;
        self.buzzer_off();
        if self.controller.pump().is_on() {
            // OFF with a level below HIGH reads as NORMAL.
            let tank = match self.controller.tank() {
                TankStatus::Filling => TankStatus::Normal,
                other => other,
            };
            self.controller.apply(&Decision {
                pump: PumpStatus::Off,
                tank,
                event: None,
                relay_edge: true,
            });
            self.shared.update(|st| st.set_status(tank, PumpStatus::Off));
        }
        tracing::info!("control loop stopped, relay de-energized");
        Ok(())
    }

    /// Run cycles at the configured cadence until `stop` is raised or
    /// `max_cycles` have run, then shut down. Returns the cycle count.
    ///
    /// A failing cycle is logged and the loop carries on.
    pub fn run(&mut self, stop: &AtomicBool, max_cycles: Option<u64>) -> Result<u64> {
        let mut ticker = Ticker::new(self.cfg.cadence());
        let mut cycles = 0u64;
        while !stop.load(Ordering::Relaxed) && max_cycles.is_none_or(|max| cycles < max) {
            if ticker.wait(&self.clock) {
                tracing::debug!(period_ms = ticker.period().as_millis() as u64, "cycle overrun");
            }
            match self.step() {
                Ok(outcome) => tracing::trace!(?outcome, "cycle done"),
                Err(e) => tracing::warn!(error = %e, "control cycle failed"),
            }
            cycles += 1;
        }
        self.shutdown()?;
        Ok(cycles)
    }

    pub fn shared(&self) -> &SharedTank {
        &self.shared
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn controller(&self) -> &PumpController {
        &self.controller
    }

    pub fn estimator(&self) -> &LevelEstimator {
        &self.estimator
    }

    pub fn pump(&self) -> PumpStatus {
        self.controller.pump()
    }

    pub fn tank(&self) -> TankStatus {
        self.controller.tank()
    }
}
