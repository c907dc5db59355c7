//! Per-retailer circuit breaker
//!
//! Closed/Open/HalfOpen state machine over an atomic failure counter. After
//! `failure_threshold` consecutive integration faults the retailer is
//! skipped for `cooldown`, then a single half-open probe is admitted; its
//! outcome decides between closing and reopening.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation
    Closed,
    /// Skipping calls until cooldown elapses
    Open,
    /// Cooldown elapsed; one probe in flight
    HalfOpen,
}

#[derive(Debug)]
struct BreakerWindow {
    open_until: Option<Instant>,
    probe_in_flight: bool,
}

/// Fault isolation for one retailer
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    window: parking_lot::Mutex<BreakerWindow>,
}

impl CircuitBreaker {
    /// Create a breaker
    #[must_use]
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            window: parking_lot::Mutex::new(BreakerWindow {
                open_until: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> BreakerState {
        let window = self.window.lock();
        match window.open_until {
            Some(until) if Instant::now() < until => BreakerState::Open,
            Some(_) => BreakerState::HalfOpen,
            None if window.probe_in_flight => BreakerState::HalfOpen,
            None => BreakerState::Closed,
        }
    }

    /// Whether a call may proceed now
    ///
    /// Open: denied. Half-open: exactly one caller is admitted as the probe.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut window = self.window.lock();
        match window.open_until {
            Some(until) if Instant::now() < until => false,
            Some(_) => {
                // Cooldown elapsed; admit a single probe.
                if window.probe_in_flight {
                    false
                } else {
                    window.open_until = None;
                    window.probe_in_flight = true;
                    true
                }
            }
            None => !window.probe_in_flight,
        }
    }

    /// Record a successful call; closes the breaker
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut window = self.window.lock();
        window.open_until = None;
        window.probe_in_flight = false;
    }

    /// Record a failed call; may open the breaker
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let mut window = self.window.lock();
        if window.probe_in_flight {
            // Failed probe: straight back to open.
            window.probe_in_flight = false;
            window.open_until = Some(Instant::now() + self.cooldown);
        } else if failures >= self.failure_threshold {
            window.open_until = Some(Instant::now() + self.cooldown);
        }
    }

    /// Consecutive integration faults since the last success
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        assert_eq!(breaker.state(), BreakerState::Closed);

        for _ in 0..2 {
            assert!(breaker.try_acquire());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);

        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn half_open_admits_one_probe() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        assert!(breaker.try_acquire());
        breaker.record_failure();

        // Zero cooldown: immediately half-open.
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(!breaker.try_acquire(), "second probe must be denied");

        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn failed_probe_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);

        // Simulate elapsed cooldown.
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert!(breaker.try_acquire()); // probe
        breaker.record_failure();
        // Reopened with the original (zero) cooldown; probe again allowed,
        // but state reflects half-open cycling rather than closed.
        assert_ne!(breaker.failure_count(), 0);
    }

    #[test]
    fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.failure_count(), 2);
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);
    }
}
