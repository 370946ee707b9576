//! Simulated reservoir for running the full stack without GPIO.
//!
//! One `SimulatedTank` holds the physical state; the ranger and actuator
//! handles share it so that energizing the relay raises the water level the
//! next time the ranger is pinged.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tank_traits::{Actuator, BoxError, Ranger, SOUND_CM_PER_US};

/// Tunables for the simulated tank.
#[derive(Debug, Clone)]
pub struct SimTankParams {
    /// Sensor-to-bottom distance, cm.
    pub height_cm: f32,
    /// Fill level at start, percent.
    pub start_level_pct: f32,
    /// Level rise per second while the relay is energized.
    pub fill_pct_per_s: f32,
    /// Constant consumption per second.
    pub drain_pct_per_s: f32,
    /// Every n-th ping gets no echo (0 disables); exercises the median filter.
    pub drop_every: u64,
    /// Never return an echo.
    pub always_timeout: bool,
}

impl Default for SimTankParams {
    fn default() -> Self {
        Self {
            height_cm: 10.0,
            start_level_pct: 50.0,
            fill_pct_per_s: 8.0,
            drain_pct_per_s: 2.0,
            drop_every: 7,
            always_timeout: false,
        }
    }
}

#[derive(Debug)]
struct SimState {
    level_pct: f32,
    relay: bool,
    buzzer: bool,
    pings: u64,
    updated: Instant,
}

#[derive(Debug, Clone)]
pub struct SimulatedTank {
    params: SimTankParams,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedTank {
    pub fn new(params: SimTankParams) -> Self {
        let state = SimState {
            level_pct: params.start_level_pct.clamp(0.0, 100.0),
            relay: false,
            buzzer: false,
            pings: 0,
            updated: Instant::now(),
        };
        Self {
            params,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn ranger(&self) -> SimulatedRanger {
        SimulatedRanger { tank: self.clone() }
    }

    pub fn actuator(&self) -> SimulatedActuator {
        SimulatedActuator { tank: self.clone() }
    }

    /// Current water level after integrating elapsed time.
    pub fn level_pct(&self) -> f32 {
        self.integrate().level_pct
    }

    pub fn relay_energized(&self) -> bool {
        self.lock().relay
    }

    pub fn buzzer_on(&self) -> bool {
        self.lock().buzzer
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn integrate(&self) -> MutexGuard<'_, SimState> {
        let mut st = self.lock();
        let now = Instant::now();
        let dt = now.saturating_duration_since(st.updated).as_secs_f32();
        st.updated = now;
        let inflow = if st.relay {
            self.params.fill_pct_per_s
        } else {
            0.0
        };
        let delta = (inflow - self.params.drain_pct_per_s) * dt;
        st.level_pct = (st.level_pct + delta).clamp(0.0, 100.0);
        st
    }
}

pub struct SimulatedRanger {
    tank: SimulatedTank,
}

impl Ranger for SimulatedRanger {
    fn emit_pulse(&mut self) -> Result<(), BoxError> {
        self.tank.lock().pings += 1;
        Ok(())
    }

    fn measure_echo(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError> {
        let params = &self.tank.params;
        let st = self.tank.integrate();
        if params.always_timeout || (params.drop_every > 0 && st.pings % params.drop_every == 0) {
            return Ok(None);
        }
        // Keep the surface a little below the transducer like a real mount.
        let distance_cm = (params.height_cm * (1.0 - st.level_pct / 100.0)).max(0.5);
        let round_trip_us = distance_cm * 2.0 / SOUND_CM_PER_US;
        let echo = Duration::from_micros(round_trip_us as u64);
        tracing::trace!(distance_cm, echo_us = echo.as_micros() as u64, "sim echo");
        Ok((echo <= timeout).then_some(echo))
    }
}

pub struct SimulatedActuator {
    tank: SimulatedTank,
}

impl Actuator for SimulatedActuator {
    fn set_relay(&mut self, energized: bool) -> Result<(), BoxError> {
        let mut st = self.tank.integrate();
        if st.relay != energized {
            tracing::debug!(energized, "sim relay");
        }
        st.relay = energized;
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), BoxError> {
        self.tank.lock().buzzer = on;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(level: f32) -> SimulatedTank {
        SimulatedTank::new(SimTankParams {
            start_level_pct: level,
            drop_every: 0,
            drain_pct_per_s: 0.0,
            ..SimTankParams::default()
        })
    }

    #[test]
    fn echo_matches_surface_distance() {
        let tank = quiet(50.0);
        let mut ranger = tank.ranger();
        ranger.emit_pulse().unwrap();
        let echo = ranger
            .measure_echo(Duration::from_millis(20))
            .unwrap()
            .expect("echo");
        let cm = echo.as_micros() as f32 * SOUND_CM_PER_US / 2.0;
        assert!((cm - 5.0).abs() < 0.05, "got {cm}");
    }

    #[test]
    fn relay_is_shared_between_handles() {
        let tank = quiet(10.0);
        let mut act = tank.actuator();
        act.set_relay(true).unwrap();
        assert!(tank.relay_energized());
        act.set_relay(false).unwrap();
        assert!(!tank.relay_energized());
    }

    #[test]
    fn always_timeout_never_echoes() {
        let tank = SimulatedTank::new(SimTankParams {
            always_timeout: true,
            ..SimTankParams::default()
        });
        let mut ranger = tank.ranger();
        ranger.emit_pulse().unwrap();
        assert!(ranger.measure_echo(Duration::from_millis(20)).unwrap().is_none());
    }
}
