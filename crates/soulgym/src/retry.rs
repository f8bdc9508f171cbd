//! Delay and retry primitives.
//!
//! Every wait in the crate goes through a [`Sleeper`] so the control loop can
//! be driven by a virtual clock in tests, or interrupted by a shutdown signal
//! in the CLI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Something that can wait for a duration
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays and returns immediately
#[derive(Debug, Default, Clone)]
pub struct VirtualClock {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Sum of all requested delays
    pub fn elapsed(&self) -> Duration {
        self.delays().iter().sum()
    }

    pub fn clear(&self) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.clear();
        }
    }
}

impl Sleeper for VirtualClock {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Shared sleeper handle
pub type SharedSleeper = Arc<dyn Sleeper + Send + Sync>;

/// Bounded fixed-delay retry policy
///
/// A failed attempt is retried after `delay`, at most `max_retries` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    #[serde(rename = "delay_ms", with = "crate::config::millis")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Single attempt, no delay
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `attempt` until it yields `Some`, sleeping between attempts.
    ///
    /// Returns `None` once all attempts are exhausted.
    pub fn run<T>(&self, sleeper: &dyn Sleeper, mut attempt: impl FnMut(u32) -> Option<T>) -> Option<T> {
        for n in 0..self.max_attempts() {
            if n > 0 {
                sleeper.sleep(self.delay);
            }
            if let Some(value) = attempt(n) {
                return Some(value);
            }
        }
        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay, Duration::from_millis(500));
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn test_run_exhausts_with_exact_delays() {
        let clock = VirtualClock::new();
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        let mut calls = 0;
        let result: Option<()> = policy.run(&clock, |_| {
            calls += 1;
            None
        });
        assert!(result.is_none());
        assert_eq!(calls, 4);
        assert_eq!(clock.delays(), vec![Duration::from_millis(250); 3]);
    }

    #[test]
    fn test_run_stops_on_success() {
        let clock = VirtualClock::new();
        let policy = RetryPolicy::default();
        let result = policy.run(&clock, |n| (n == 2).then_some(n));
        assert_eq!(result, Some(2));
        assert_eq!(clock.delays().len(), 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_no_retry_policy() {
        let clock = VirtualClock::new();
        let result: Option<()> = RetryPolicy::none().run(&clock, |_| None);
        assert!(result.is_none());
        assert!(clock.delays().is_empty());
    }
}
