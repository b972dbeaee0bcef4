//! Error types used by the taskwarden engine.
//!
//! This module defines three enums:
//!
//! - [`ConfigError`]: configuration rejected at construction time (fail fast).
//! - [`LifecycleError`]: an [`Engine`](crate::Engine) lifecycle transition that is not allowed.
//! - [`Cause`]: the fixed root cause carried by every [`Alert`](crate::Alert).
//!
//! All of them provide `as_label` for logging. None of them is ever raised by a
//! supervised task: task faults are contained and converted to alerts.

use std::time::Duration;
use thiserror::Error;

/// # Configuration rejected by [`Config::validate`](crate::Config::validate).
///
/// Values outside the published bounds are refused, never clamped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting is outside its allowed range.
    #[error("{field} out of range: got {value}, allowed {min}..={max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value, rendered for display.
        value: String,
        /// Inclusive lower bound.
        min: String,
        /// Inclusive upper bound.
        max: String,
    },

    /// The engine was built without an alert consumer.
    #[error("alert consumer is required")]
    MissingConsumer,
}

impl ConfigError {
    /// Builds an [`ConfigError::OutOfRange`] for an integer setting.
    pub(crate) fn count(field: &'static str, value: u64, min: u64, max: u64) -> Self {
        ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Builds an [`ConfigError::OutOfRange`] for a duration setting.
    pub(crate) fn duration(
        field: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    ) -> Self {
        ConfigError::OutOfRange {
            field,
            value: format!("{value:?}"),
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskwarden::ConfigError;
    ///
    /// assert_eq!(ConfigError::MissingConsumer.as_label(), "config_missing_consumer");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::OutOfRange { .. } => "config_out_of_range",
            ConfigError::MissingConsumer => "config_missing_consumer",
        }
    }
}

/// # Rejected lifecycle transition.
///
/// The engine lifecycle is one-way: `Created → Watching → Closed`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// `watch` was called a second time.
    #[error("engine is already watching")]
    AlreadyWatching,

    /// The engine was closed; it cannot be started again.
    #[error("engine is closed")]
    Closed,
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::AlreadyWatching => "lifecycle_already_watching",
            LifecycleError::Closed => "lifecycle_closed",
        }
    }
}

/// # Root cause reported by an alert.
///
/// Exactly one cause exists per [`AlertKind`](crate::AlertKind).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// A supervised task panicked.
    #[error("task panicked")]
    TaskPanicked,

    /// A supervised task kept running past its teardown timeout after cancellation.
    #[error("task not compliant with cancellation")]
    NotCancellationCompliant,

    /// Accumulated errors reached the tolerance cap.
    #[error("tolerance exceeded")]
    ToleranceExceeded,
}

impl Cause {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskwarden::Cause;
    ///
    /// assert_eq!(Cause::TaskPanicked.as_label(), "task_panicked");
    /// assert_eq!(Cause::TaskPanicked.to_string(), "task panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Cause::TaskPanicked => "task_panicked",
            Cause::NotCancellationCompliant => "task_not_cancellation_compliant",
            Cause::ToleranceExceeded => "tolerance_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ConfigError::count("tolerance_cap", 0, 1, 1_000_000);
        assert_eq!(
            err.to_string(),
            "tolerance_cap out of range: got 0, allowed 1..=1000000"
        );
        assert_eq!(err.as_label(), "config_out_of_range");
    }

    #[test]
    fn test_duration_out_of_range_message() {
        let err = ConfigError::duration(
            "teardown_timeout",
            Duration::from_secs(1),
            Duration::from_millis(5),
            Duration::from_millis(200),
        );
        assert_eq!(
            err.to_string(),
            "teardown_timeout out of range: got 1s, allowed 5ms..=200ms"
        );
    }

    #[test]
    fn test_cause_sentinels() {
        assert_eq!(
            Cause::NotCancellationCompliant.to_string(),
            "task not compliant with cancellation"
        );
        assert_eq!(Cause::ToleranceExceeded.to_string(), "tolerance exceeded");
        assert_eq!(LifecycleError::Closed.as_label(), "lifecycle_closed");
    }
}
