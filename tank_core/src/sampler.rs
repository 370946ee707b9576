//! Ultrasonic distance sampling.
//!
//! One reading is the median of `samples` trigger/echo round trips. A ping
//! that times out or errors contributes `OUT_OF_RANGE_CM`, so a majority of
//! bad pings yields the sentinel and the cycle is skipped downstream.
use std::sync::Arc;
use std::time::Duration;

use tank_traits::{Clock, Ranger, SOUND_CM_PER_US};

use crate::config::SamplerCfg;
use crate::hw_error::map_hw_error;

/// Distance reported for a ping without a usable echo.
pub const OUT_OF_RANGE_CM: f32 = 999.0;

/// Round-trip echo width to one-way distance.
#[inline]
pub fn echo_to_cm(width: Duration) -> f32 {
    width.as_secs_f32() * 1_000_000.0 * SOUND_CM_PER_US / 2.0
}

/// Median of `values`, reordering the slice in place.
///
/// Even lengths take the upper middle element. An empty slice yields
/// `OUT_OF_RANGE_CM`.
pub fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return OUT_OF_RANGE_CM;
    }
    values.sort_unstable_by(f32::total_cmp);
    values[values.len() / 2]
}

pub struct DistanceSampler<R: Ranger> {
    ranger: R,
    cfg: SamplerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    buf: Vec<f32>,
}

impl<R: Ranger> DistanceSampler<R> {
    pub fn new(ranger: R, cfg: SamplerCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let n = cfg.samples.max(1);
        Self {
            ranger,
            cfg,
            clock,
            buf: Vec::with_capacity(n),
        }
    }

    /// Take one median-filtered distance in cm.
    pub fn sample(&mut self) -> f32 {
        let n = self.cfg.samples.max(1);
        let timeout = self.cfg.echo_timeout();
        self.buf.clear();
        for i in 0..n {
            let d = self.ping(timeout);
            self.buf.push(d);
            if i + 1 < n {
                self.clock.sleep(self.cfg.sample_gap());
            }
        }
        let d = median(&mut self.buf);
        tracing::trace!(distance_cm = d, pings = n, "distance sample");
        d
    }

    fn ping(&mut self, timeout: Duration) -> f32 {
        if let Err(e) = self.ranger.emit_pulse() {
            tracing::warn!(error = %map_hw_error(e.as_ref()), "trigger failed");
            return OUT_OF_RANGE_CM;
        }
        match self.ranger.measure_echo(timeout) {
            Ok(Some(width)) => echo_to_cm(width),
            Ok(None) => OUT_OF_RANGE_CM,
            Err(e) => {
                tracing::warn!(error = %map_hw_error(e.as_ref()), "echo read failed");
                OUT_OF_RANGE_CM
            }
        }
    }

    /// Upper bound on one `sample` call.
    pub fn worst_case(&self) -> Duration {
        self.cfg.worst_case()
    }
}
