//! Loop pacing.
use std::time::{Duration, Instant};

use tank_traits::Clock;

/// Fixed-rate ticker on top of a `Clock`.
///
/// Deadlines advance by whole periods so jitter does not accumulate. When a
/// cycle overruns past its deadline the schedule is re-anchored to now
/// instead of firing a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    /// A zero period is bumped to 1 ms.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next tick. Returns `true` if the deadline had already
    /// passed (overrun).
    pub fn wait<C: Clock + ?Sized>(&mut self, clock: &C) -> bool {
        let now = clock.now();
        let Some(deadline) = self.next else {
            self.next = Some(now + self.period);
            return false;
        };
        if now > deadline {
            self.next = Some(now + self.period);
            return true;
        }
        clock.sleep(clock.until(deadline));
        self.next = Some(deadline + self.period);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_traits::clock::test_clock::TestClock;

    #[test]
    fn sleeps_remaining_period() {
        let clock = TestClock::new();
        let mut t = Ticker::new(Duration::from_millis(100));
        assert!(!t.wait(&clock));
        clock.advance(Duration::from_millis(30));
        assert!(!t.wait(&clock));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(70)]);
    }

    #[test]
    fn overrun_reanchors() {
        let clock = TestClock::new();
        let mut t = Ticker::new(Duration::from_millis(100));
        t.wait(&clock);
        clock.advance(Duration::from_millis(350));
        assert!(t.wait(&clock));
        assert!(clock.sleeps().is_empty());
        clock.advance(Duration::from_millis(10));
        assert!(!t.wait(&clock));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(90)]);
    }

    #[test]
    fn zero_period_is_clamped() {
        assert_eq!(Ticker::new(Duration::ZERO).period(), Duration::from_millis(1));
    }
}
