//! # Engine configuration.
//!
//! [`Config`] centralizes every tunable of the [`Engine`](crate::Engine):
//! alert channel capacity, alert delivery timeout, teardown (grace) timeout,
//! tolerance window and tolerance cap.
//!
//! Configuration is read-only once the engine is built. Every field has a
//! published inclusive range; [`Config::validate`] rejects anything outside of
//! it instead of clamping, and [`EngineBuilder::build`](crate::EngineBuilder::build)
//! calls it before any resource is allocated.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskwarden::Config;
//!
//! let cfg = Config::default()
//!     .with_tolerance_cap(5)
//!     .with_teardown_timeout(Duration::from_millis(20));
//! assert!(cfg.validate().is_ok());
//!
//! let bad = Config::default().with_alert_capacity(0);
//! assert!(bad.validate().is_err());
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// Default capacity of the alert channel.
pub const DEFAULT_ALERT_CAPACITY: usize = 1024;
/// Default maximum wait when enqueueing an alert into a full channel.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(10);
/// Default grace period a task has to stop after cancellation.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(50);
/// Default interval between tolerance evaluations.
pub const DEFAULT_TOLERANCE_WINDOW: Duration = Duration::from_millis(100);
/// Default number of errors tolerated before a burst alert.
pub const DEFAULT_TOLERANCE_CAP: u32 = 2;

// Inclusive bounds enforced by `Config::validate`.

pub const MIN_ALERT_CAPACITY: usize = 1;
pub const MAX_ALERT_CAPACITY: usize = 1024 * 1024;

pub const MIN_DELIVERY_TIMEOUT: Duration = Duration::from_millis(5);
pub const MAX_DELIVERY_TIMEOUT: Duration = Duration::from_millis(500);

pub const MIN_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(5);
pub const MAX_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(200);

pub const MIN_TOLERANCE_WINDOW: Duration = Duration::from_millis(5);
pub const MAX_TOLERANCE_WINDOW: Duration = Duration::from_secs(60);

pub const MIN_TOLERANCE_CAP: u32 = 1;
pub const MAX_TOLERANCE_CAP: u32 = 1_000_000;

/// Configuration of a watchdog [`Engine`](crate::Engine).
///
/// ## Field semantics
/// - `alert_capacity`: fixed size of the alert queue, never resized
/// - `delivery_timeout`: how long a producer may wait on a full queue before the alert is dropped
/// - `teardown_timeout`: grace period between cancellation and a non-compliance alert
/// - `tolerance_window`: period of the tolerance monitor
/// - `tolerance_cap`: error count at which a burst alert fires
///
/// All fields are public; prefer the `with_*` helpers for partial overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the bounded alert channel.
    pub alert_capacity: usize,

    /// Maximum time a producer waits to enqueue an alert.
    ///
    /// Once it elapses the alert is dropped. A stalled consumer never blocks
    /// supervision or tolerance monitoring for longer than this.
    pub delivery_timeout: Duration,

    /// Grace period a task has to return after its token is cancelled.
    pub teardown_timeout: Duration,

    /// Interval at which the error counter is sampled.
    pub tolerance_window: Duration,

    /// Errors tolerated before a `ToleranceExceeded` alert is emitted.
    pub tolerance_cap: u32,
}

impl Config {
    /// Overrides the alert channel capacity.
    #[must_use]
    pub fn with_alert_capacity(mut self, capacity: usize) -> Self {
        self.alert_capacity = capacity;
        self
    }

    /// Overrides the alert delivery timeout.
    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Overrides the teardown (grace) timeout.
    #[must_use]
    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Overrides the tolerance window.
    #[must_use]
    pub fn with_tolerance_window(mut self, window: Duration) -> Self {
        self.tolerance_window = window;
        self
    }

    /// Overrides the tolerance cap.
    #[must_use]
    pub fn with_tolerance_cap(mut self, cap: u32) -> Self {
        self.tolerance_cap = cap;
        self
    }

    /// Checks every field against its published bounds.
    ///
    /// Returns the first violation found, in field declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ALERT_CAPACITY..=MAX_ALERT_CAPACITY).contains(&self.alert_capacity) {
            return Err(ConfigError::count(
                "alert_capacity",
                self.alert_capacity as u64,
                MIN_ALERT_CAPACITY as u64,
                MAX_ALERT_CAPACITY as u64,
            ));
        }
        check_duration(
            "delivery_timeout",
            self.delivery_timeout,
            MIN_DELIVERY_TIMEOUT,
            MAX_DELIVERY_TIMEOUT,
        )?;
        check_duration(
            "teardown_timeout",
            self.teardown_timeout,
            MIN_TEARDOWN_TIMEOUT,
            MAX_TEARDOWN_TIMEOUT,
        )?;
        check_duration(
            "tolerance_window",
            self.tolerance_window,
            MIN_TOLERANCE_WINDOW,
            MAX_TOLERANCE_WINDOW,
        )?;
        if !(MIN_TOLERANCE_CAP..=MAX_TOLERANCE_CAP).contains(&self.tolerance_cap) {
            return Err(ConfigError::count(
                "tolerance_cap",
                u64::from(self.tolerance_cap),
                u64::from(MIN_TOLERANCE_CAP),
                u64::from(MAX_TOLERANCE_CAP),
            ));
        }
        Ok(())
    }
}

fn check_duration(
    field: &'static str,
    value: Duration,
    min: Duration,
    max: Duration,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::duration(field, value, min, max));
    }
    Ok(())
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `alert_capacity = 1024`
    /// - `delivery_timeout = 10ms`
    /// - `teardown_timeout = 50ms`
    /// - `tolerance_window = 100ms`
    /// - `tolerance_cap = 2`
    fn default() -> Self {
        Self {
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            tolerance_window: DEFAULT_TOLERANCE_WINDOW,
            tolerance_cap: DEFAULT_TOLERANCE_CAP,
        }
    }
}
