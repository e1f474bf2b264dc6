//! Capped exponential backoff between reconnect attempts.
//!
//! The delay starts at [`BackoffConfig::initial_delay`], doubles after each
//! consecutive failure up to [`BackoffConfig::max_delay`], and returns to the
//! initial delay once a connection has delivered data again.

use std::time::Duration;

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Backoff state for one subscription.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let current = config.initial_delay.min(config.max_delay);
        Self { config, current }
    }

    /// Delay the next failure will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a failure: returns the delay to wait now and grows the next one.
    pub fn fail(&mut self) -> Duration {
        let delay = self.current;
        self.current = next_delay(self.current, &self.config);
        delay
    }

    /// Return to the initial delay after a successful read.
    pub fn reset(&mut self) {
        self.current = self.config.initial_delay.min(self.config.max_delay);
    }
}
