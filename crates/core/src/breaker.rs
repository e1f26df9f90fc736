use chrono::{DateTime, Duration, Utc};

//
// ─── SETTINGS ─────────────────────────────────────────────────────────────────
//

/// Tuning knobs for a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failures that trip the breaker open.
    pub failure_threshold: u32,
    /// How long the breaker stays open before resetting.
    pub cooldown: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::seconds(60),
        }
    }
}

//
// ─── CIRCUIT BREAKER ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed { consecutive_failures: u32 },
    Open { until: DateTime<Utc> },
}

/// Two-state guard that halts an operation after repeated failures.
///
/// CLOSED counts consecutive failures; reaching the threshold opens the
/// breaker for a fixed cooldown. OPEN drops everything until the cooldown
/// elapses, then resets straight to CLOSED with the counter zeroed. There
/// is no half-open probe state.
///
/// Time is passed in by the caller, so instances are trivially testable
/// and multiple independent breakers can coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreaker {
    settings: BreakerSettings,
    state: BreakerState,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerSettings::default())
    }
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            state: BreakerState::Closed {
                consecutive_failures: 0,
            },
        }
    }

    #[must_use]
    pub fn settings(&self) -> BreakerSettings {
        self.settings
    }

    /// Whether requests should currently be dropped.
    ///
    /// An open breaker whose cooldown has elapsed resets to closed as a
    /// side effect and reports itself closed.
    pub fn is_open(&mut self, now: DateTime<Utc>) -> bool {
        if let BreakerState::Open { until } = self.state {
            if now < until {
                return true;
            }
            self.state = BreakerState::Closed {
                consecutive_failures: 0,
            };
        }
        false
    }

    /// Current consecutive-failure count (zero while open).
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        match self.state {
            BreakerState::Closed {
                consecutive_failures,
            } => consecutive_failures,
            BreakerState::Open { .. } => 0,
        }
    }

    /// Record a successful write, clearing the failure streak.
    pub fn record_success(&mut self) {
        if let BreakerState::Closed {
            consecutive_failures,
        } = &mut self.state
        {
            *consecutive_failures = 0;
        }
    }

    /// Record a failed write.
    ///
    /// Returns `true` if this failure tripped the breaker open.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> bool {
        let BreakerState::Closed {
            consecutive_failures,
        } = &mut self.state
        else {
            return false;
        };

        *consecutive_failures += 1;
        if *consecutive_failures >= self.settings.failure_threshold {
            self.state = BreakerState::Open {
                until: now + self.settings.cooldown,
            };
            return true;
        }
        false
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn stays_closed_below_threshold() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::default();

        assert!(!breaker.record_failure(now));
        assert!(!breaker.record_failure(now));
        assert!(!breaker.is_open(now));
        assert_eq!(breaker.consecutive_failures(), 2);
    }

    #[test]
    fn success_clears_the_streak() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::default();

        breaker.record_failure(now);
        breaker.record_failure(now);
        breaker.record_success();
        assert_eq!(breaker.consecutive_failures(), 0);

        // Two more failures still don't reach the threshold of three.
        breaker.record_failure(now);
        breaker.record_failure(now);
        assert!(!breaker.is_open(now));
    }

    #[test]
    fn third_failure_trips_open() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::default();

        breaker.record_failure(now);
        breaker.record_failure(now);
        assert!(breaker.record_failure(now));
        assert!(breaker.is_open(now));
        assert!(breaker.is_open(now + Duration::seconds(59)));
    }

    #[test]
    fn cooldown_elapse_resets_to_closed() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::default();
        for _ in 0..3 {
            breaker.record_failure(now);
        }

        let later = now + Duration::seconds(61);
        assert!(!breaker.is_open(later));
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn failures_while_open_are_ignored() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::default();
        for _ in 0..3 {
            breaker.record_failure(now);
        }

        assert!(!breaker.record_failure(now + Duration::seconds(1)));
        // The original cooldown window is unchanged.
        assert!(breaker.is_open(now + Duration::seconds(59)));
        assert!(!breaker.is_open(now + Duration::seconds(60)));
    }

    #[test]
    fn custom_settings_are_honored() {
        let now = fixed_now();
        let mut breaker = CircuitBreaker::new(BreakerSettings {
            failure_threshold: 1,
            cooldown: Duration::seconds(5),
        });

        assert!(breaker.record_failure(now));
        assert!(breaker.is_open(now + Duration::seconds(4)));
        assert!(!breaker.is_open(now + Duration::seconds(5)));
    }
}
