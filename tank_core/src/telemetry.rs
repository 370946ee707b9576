//! Shared tank state and the read-only snapshot handed to observers.
//!
//! Everything an observer can see (level, statuses, fill stamp, counter and
//! the event log) sits behind one mutex. The control loop publishes a whole
//! cycle in a single `update`, and `snapshot` copies under the same lock, so
//! a reader never sees fields from two different cycles.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::event_log::{EventLog, LogEntry};
use crate::status::{PumpStatus, TankStatus};

/// `last` value reported before the first completed fill.
pub const NEVER_FILLED: &str = "--:--:--";

#[derive(Debug, Default)]
pub struct TankState {
    level_pct: f32,
    tank: TankStatus,
    pump: PumpStatus,
    last_filled: Option<String>,
    monthly_fills: u32,
    log: EventLog,
}

impl TankState {
    pub fn set_level(&mut self, level_pct: f32) {
        self.level_pct = level_pct.clamp(0.0, 100.0);
    }

    pub fn set_status(&mut self, tank: TankStatus, pump: PumpStatus) {
        self.tank = tank;
        self.pump = pump;
    }

    pub fn record_fill(&mut self, at: String, monthly_fills: u32) {
        self.last_filled = Some(at);
        self.monthly_fills = monthly_fills;
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.log.append(entry);
    }

    pub fn level_pct(&self) -> f32 {
        self.level_pct
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            level_pct: self.level_pct,
            tank: self.tank,
            pump: self.pump,
            last_filled: self.last_filled.clone(),
            monthly_fills: self.monthly_fills,
            history: self.log.snapshot(),
        }
    }
}

/// Cheap-to-clone handle on the shared state.
#[derive(Debug, Clone, Default)]
pub struct SharedTank {
    inner: Arc<Mutex<TankState>>,
}

impl SharedTank {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere must not take the telemetry endpoint down with it;
    // every write leaves the state whole, so a poisoned guard is still valid.
    fn lock(&self) -> MutexGuard<'_, TankState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside the critical section. Keep `f` to memory work only.
    pub fn update<R>(&self, f: impl FnOnce(&mut TankState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn append_event(&self, entry: LogEntry) {
        self.lock().append(entry);
    }

    /// Consistent copy of every observable field.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.lock().snapshot()
    }

    pub fn level_pct(&self) -> f32 {
        self.lock().level_pct()
    }
}

/// Immutable aggregate for one instant of the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub level_pct: f32,
    pub tank: TankStatus,
    pub pump: PumpStatus,
    pub last_filled: Option<String>,
    pub monthly_fills: u32,
    /// Newest first.
    pub history: Vec<LogEntry>,
}

impl TelemetrySnapshot {
    /// Level rounded to one decimal place.
    pub fn level_rounded(&self) -> f32 {
        (self.level_pct * 10.0).round() / 10.0
    }

    pub fn last_filled_or_placeholder(&self) -> &str {
        self.last_filled.as_deref().unwrap_or(NEVER_FILLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_reports_boot_defaults() {
        let snap = SharedTank::new().snapshot();
        assert_eq!(snap.tank, TankStatus::Unknown);
        assert_eq!(snap.pump, PumpStatus::Off);
        assert_eq!(snap.monthly_fills, 0);
        assert_eq!(snap.last_filled_or_placeholder(), NEVER_FILLED);
        assert!(snap.history.is_empty());
    }

    #[test]
    fn level_is_clamped_and_rounded() {
        let shared = SharedTank::new();
        shared.update(|st| st.set_level(142.0));
        assert_eq!(shared.level_pct(), 100.0);
        shared.update(|st| st.set_level(42.36));
        assert_eq!(shared.snapshot().level_rounded(), 42.4);
    }

    #[test]
    fn update_is_visible_as_one_unit() {
        let shared = SharedTank::new();
        shared.update(|st| {
            st.set_level(85.0);
            st.set_status(TankStatus::Full, PumpStatus::Off);
            st.record_fill("10:00:00".into(), 1);
            st.append(LogEntry::new("10:00:00", "Tank FULL, pump OFF"));
        });
        let snap = shared.snapshot();
        assert_eq!(snap.tank, TankStatus::Full);
        assert_eq!(snap.last_filled_or_placeholder(), "10:00:00");
        assert_eq!(snap.monthly_fills, 1);
        assert_eq!(snap.history[0].action(), "Tank FULL, pump OFF");
    }
}
