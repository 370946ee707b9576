//! Distance-to-level conversion with EMA smoothing.
use crate::error::TankError;

/// Fill percentage for a transducer-to-surface distance, or `None` when
/// the distance is not physically possible for a tank of `height_cm`.
///
/// Valid distances are in `(0, height_cm]`; the result is then in `[0, 100)`.
pub fn instant_level(distance_cm: f32, height_cm: f32) -> Option<f32> {
    if !distance_cm.is_finite() || distance_cm <= 0.0 || distance_cm > height_cm {
        return None;
    }
    Some(((height_cm - distance_cm) / height_cm * 100.0).clamp(0.0, 100.0))
}

/// Exponential moving average of the instantaneous level.
///
/// The first accepted reading seeds the filter, so start-up does not ramp
/// from zero.
#[derive(Debug, Clone)]
pub struct LevelEstimator {
    alpha: f32,
    level: Option<f32>,
}

impl LevelEstimator {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            level: None,
        }
    }

    /// Fold one distance reading in and return the smoothed level.
    ///
    /// Invalid readings are rejected and leave the filter untouched.
    pub fn update(&mut self, distance_cm: f32, height_cm: f32) -> Result<f32, TankError> {
        let instant = instant_level(distance_cm, height_cm)
            .ok_or(TankError::SensorInvalid { distance_cm })?;
        let next = match self.level {
            None => instant,
            Some(prev) => self.alpha * instant + (1.0 - self.alpha) * prev,
        };
        let next = next.clamp(0.0, 100.0);
        self.level = Some(next);
        Ok(next)
    }

    /// Smoothed level, 0 before the first valid reading.
    pub fn level(&self) -> f32 {
        self.level.unwrap_or(0.0)
    }

    pub fn is_seeded(&self) -> bool {
        self.level.is_some()
    }

    pub fn reset(&mut self) {
        self.level = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::OUT_OF_RANGE_CM;
    use rstest::rstest;

    #[rstest]
    #[case(10.0, Some(0.0))]
    #[case(5.0, Some(50.0))]
    #[case(1.0, Some(90.0))]
    #[case(0.0, None)]
    #[case(-2.0, None)]
    #[case(10.5, None)]
    #[case(OUT_OF_RANGE_CM, None)]
    #[case(f32::NAN, None)]
    fn instant_level_cases(#[case] d: f32, #[case] expected: Option<f32>) {
        let got = instant_level(d, 10.0);
        match (got, expected) {
            (Some(g), Some(e)) => assert!((g - e).abs() < 1e-4, "{g} vs {e}"),
            (g, e) => assert_eq!(g, e),
        }
    }

    #[test]
    fn first_reading_seeds_then_smooths() {
        let mut est = LevelEstimator::new(0.3);
        assert!(!est.is_seeded());
        let l = est.update(5.0, 10.0).expect("valid");
        assert!((l - 50.0).abs() < 1e-4);
        // 0.3 * 90 + 0.7 * 50 = 62
        let l = est.update(1.0, 10.0).expect("valid");
        assert!((l - 62.0).abs() < 1e-3);
    }

    #[test]
    fn invalid_reading_leaves_filter_untouched() {
        let mut est = LevelEstimator::new(0.3);
        est.update(5.0, 10.0).expect("valid");
        let err = est.update(OUT_OF_RANGE_CM, 10.0).unwrap_err();
        assert_eq!(
            err,
            TankError::SensorInvalid {
                distance_cm: OUT_OF_RANGE_CM
            }
        );
        assert!((est.level() - 50.0).abs() < 1e-4);
        est.reset();
        assert_eq!(est.level(), 0.0);
    }
}
