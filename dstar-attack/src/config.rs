//! Starvation run configuration

use dstar_core::{Error, Result};
use dstar_dhcp::DEFAULT_ATTEMPT_TIMEOUT;
use std::time::Duration;

/// Longest accepted wait for an unanswered exchange
pub const MAX_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Tuning knobs for one starvation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarvationConfig {
    /// Pause between consecutive triggers
    pub interval: Duration,
    /// How long an unanswered exchange may hold the correlator
    pub attempt_timeout: Duration,
    /// Stop after this many leases (None = run until stopped)
    pub max_leases: Option<usize>,
    /// Stop after this long (None = run until stopped)
    pub duration: Option<Duration>,
    /// Upper bound on one blocking receive, so the receive loop notices a stop
    pub read_timeout: Duration,
}

impl Default for StarvationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_leases: None,
            duration: None,
            read_timeout: Duration::from_millis(250),
        }
    }
}

impl StarvationConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_max_leases(mut self, max_leases: usize) -> Self {
        self.max_leases = Some(max_leases);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Reject values that would stall or spin the run loops
    pub fn validate(&self) -> Result<()> {
        if self.attempt_timeout.is_zero() {
            return Err(Error::invalid_parameter(
                "attempt_timeout",
                "must be greater than zero",
            ));
        }
        if self.attempt_timeout > MAX_ATTEMPT_TIMEOUT {
            return Err(Error::InvalidParameter {
                name: "attempt_timeout".to_string(),
                reason: format!("must not exceed {} seconds", MAX_ATTEMPT_TIMEOUT.as_secs()),
            });
        }
        if self.read_timeout.is_zero() {
            return Err(Error::invalid_parameter(
                "read_timeout",
                "must be greater than zero",
            ));
        }
        if self.max_leases == Some(0) {
            return Err(Error::invalid_parameter("max_leases", "must be at least 1"));
        }
        if self.duration.is_some_and(|d| d.is_zero()) {
            return Err(Error::invalid_parameter("duration", "must be greater than zero"));
        }
        Ok(())
    }
}
