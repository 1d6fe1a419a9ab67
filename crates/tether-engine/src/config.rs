//! Bridge configuration, validation, and error types.
//!
//! [`BridgeConfig`] controls how the simulation thread interleaves
//! stepping with command draining. [`validate()`](BridgeConfig::validate)
//! checks it before any thread is spawned.

use std::time::Duration;

use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`BridgeConfig::validate()`] or at spawn time.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// `step_rate_hz` is NaN, infinite, zero, or negative.
    #[error("step_rate_hz must be finite and positive, got {value}")]
    InvalidStepRate {
        /// The invalid value.
        value: f64,
    },
    /// `idle_poll_ms` is zero, which would turn idle waiting into a spin.
    #[error("idle_poll_ms must be at least 1")]
    IdlePollZero,
    /// `queue_capacity` is `Some(0)`.
    #[error("queue_capacity must be at least 1 when bounded")]
    QueueCapacityZero,
    /// `max_consecutive_step_failures` is zero.
    #[error("max_consecutive_step_failures must be at least 1")]
    FailureLimitZero,
    /// The thread name is empty or contains a NUL byte.
    #[error("invalid thread name: {reason}")]
    InvalidThreadName {
        /// Why the name was rejected.
        reason: String,
    },
    /// The simulation thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// OS error description.
        reason: String,
    },
}

// ── BridgeConfig ───────────────────────────────────────────────────

/// Configuration for [`Runtime`](crate::runtime::Runtime).
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Upper bound on steps per second. `None` = step as fast as the
    /// solver allows, draining the queue before every step. When set,
    /// the remainder of each step budget is spent waiting on the queue,
    /// so commands arriving mid-budget still run immediately.
    pub step_rate_hz: Option<f64>,
    /// How long the loop blocks on the queue while the solver reports
    /// [`Idle`](tether_core::StepOutcome::Idle). Also bounds shutdown
    /// latency in that state. Default: 10.
    pub idle_poll_ms: u64,
    /// `None` = unbounded queue. `Some(n)` = at most `n` pending
    /// commands; producers block (backpressure) when it is full, they
    /// are never rejected.
    pub queue_capacity: Option<usize>,
    /// Consecutive failed steps after which stepping is disabled. The
    /// loop keeps draining commands afterwards. Default: 3.
    pub max_consecutive_step_failures: u32,
    /// Name of the simulation thread. Default: `"tether-sim"`.
    pub thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            step_rate_hz: None,
            idle_poll_ms: 10,
            queue_capacity: None,
            max_consecutive_step_failures: 3,
            thread_name: "tether-sim".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hz) = self.step_rate_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(ConfigError::InvalidStepRate { value: hz });
            }
        }
        if self.idle_poll_ms == 0 {
            return Err(ConfigError::IdlePollZero);
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::QueueCapacityZero);
        }
        if self.max_consecutive_step_failures == 0 {
            return Err(ConfigError::FailureLimitZero);
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::InvalidThreadName {
                reason: "empty".into(),
            });
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                reason: "contains NUL".into(),
            });
        }
        Ok(())
    }

    /// Per-step time budget derived from `step_rate_hz`.
    pub fn step_budget(&self) -> Option<Duration> {
        self.step_rate_hz.map(|hz| Duration::from_secs_f64(1.0 / hz))
    }

    /// Idle wait as a [`Duration`].
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = BridgeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.step_budget(), None);
        assert_eq!(cfg.idle_poll(), Duration::from_millis(10));
    }

    #[test]
    fn step_rate_must_be_positive_and_finite() {
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let cfg = BridgeConfig {
                step_rate_hz: Some(bad),
                ..BridgeConfig::default()
            };
            assert!(
                matches!(cfg.validate(), Err(ConfigError::InvalidStepRate { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn step_budget_from_rate() {
        let cfg = BridgeConfig {
            step_rate_hz: Some(50.0),
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.step_budget(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn zero_values_rejected() {
        let cfg = BridgeConfig {
            idle_poll_ms: 0,
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::IdlePollZero));

        let cfg = BridgeConfig {
            queue_capacity: Some(0),
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::QueueCapacityZero));

        let cfg = BridgeConfig {
            max_consecutive_step_failures: 0,
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::FailureLimitZero));
    }

    #[test]
    fn thread_name_checked() {
        let cfg = BridgeConfig {
            thread_name: String::new(),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidThreadName { .. })
        ));
    }
}
