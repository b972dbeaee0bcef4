//! # Alerts emitted by the watchdog.
//!
//! The [`AlertKind`] enum is a closed classification of the problems the
//! engine can observe:
//! - **PanicDetected**: a supervised task panicked (carries a [`PanicPayload`]);
//! - **CancellationNonCompliant**: a task outlived its teardown timeout after cancellation;
//! - **ToleranceExceeded**: the error counter reached the tolerance cap within a window.
//!
//! An [`Alert`] is immutable once built. Its kind fully determines which of the
//! other fields are meaningful, so fields are only reachable through accessors
//! and the only constructors are the per-kind ones.
//!
//! ## Ordering
//! Every alert gets a globally unique sequence number (`seq`) that increases
//! monotonically at construction. Delivery order is enqueue order, which may
//! differ from `seq` order across concurrent producers.
//!
//! ## Example
//! ```rust
//! use taskwarden::{Alert, AlertKind, Cause};
//!
//! let alert = Alert::tolerance_exceeded(3);
//! assert_eq!(alert.kind(), AlertKind::ToleranceExceeded);
//! assert_eq!(alert.error_count(), 3);
//! assert_eq!(alert.cause(), Cause::ToleranceExceeded);
//! assert!(alert.payload().is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use crate::error::Cause;

/// Global sequence counter for alert ordering.
static ALERT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// A supervised task panicked.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `payload`: the recovered panic
    PanicDetected,

    /// A supervised task did not return within the teardown timeout after cancellation.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `grace`: the teardown timeout that elapsed
    CancellationNonCompliant,

    /// The error counter reached the tolerance cap.
    ///
    /// Sets:
    /// - `error_count`: counter value observed by the tolerance monitor
    ToleranceExceeded,
}

impl AlertKind {
    /// Returns the fixed cause associated with this kind.
    pub fn cause(self) -> Cause {
        match self {
            AlertKind::PanicDetected => Cause::TaskPanicked,
            AlertKind::CancellationNonCompliant => Cause::NotCancellationCompliant,
            AlertKind::ToleranceExceeded => Cause::ToleranceExceeded,
        }
    }

    /// Returns a short stable label (kebab-case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            AlertKind::PanicDetected => "panic-detected",
            AlertKind::CancellationNonCompliant => "cancellation-non-compliant",
            AlertKind::ToleranceExceeded => "tolerance-exceeded",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// The value a task panicked with.
///
/// The message is extracted eagerly when the payload is a `&'static str` or a
/// `String` (what `panic!` produces). The raw payload itself can be taken out
/// exactly once by whoever needs the original object.
pub struct PanicPayload {
    message: Option<Arc<str>>,
    raw: Mutex<Option<Box<dyn Any + Send>>>,
}

impl PanicPayload {
    /// Wraps a payload recovered by `catch_unwind`.
    pub fn new(raw: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = raw.downcast_ref::<&'static str>() {
            Some(Arc::from(*s))
        } else {
            raw.downcast_ref::<String>().map(|s| Arc::from(s.as_str()))
        };
        Self {
            message,
            raw: Mutex::new(Some(raw)),
        }
    }

    /// Panic message, if the payload was a string.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Takes the original panic object.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_raw(&self) -> Option<Box<dyn Any + Send>> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicPayload")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// One observed problem, delivered to the [`Consume`](crate::Consume) implementation.
///
/// - `seq`: monotonic global sequence
/// - `at`: wall-clock timestamp
/// - the remaining fields depend on the [`AlertKind`]
#[derive(Clone, Debug)]
pub struct Alert {
    seq: u64,
    at: SystemTime,
    kind: AlertKind,
    error_count: u32,
    task: Option<Arc<str>>,
    grace: Option<Duration>,
    payload: Option<Arc<PanicPayload>>,
}

impl Alert {
    fn new(kind: AlertKind) -> Self {
        Self {
            seq: ALERT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            error_count: 0,
            task: None,
            grace: None,
            payload: None,
        }
    }

    /// Builds a `PanicDetected` alert for `task`.
    pub fn panic_detected(task: impl Into<Arc<str>>, payload: PanicPayload) -> Self {
        Self {
            task: Some(task.into()),
            payload: Some(Arc::new(payload)),
            ..Self::new(AlertKind::PanicDetected)
        }
    }

    /// Builds a `CancellationNonCompliant` alert for `task` after `grace` elapsed.
    pub fn non_compliant(task: impl Into<Arc<str>>, grace: Duration) -> Self {
        Self {
            task: Some(task.into()),
            grace: Some(grace),
            ..Self::new(AlertKind::CancellationNonCompliant)
        }
    }

    /// Builds a `ToleranceExceeded` alert with the sampled error count.
    pub fn tolerance_exceeded(error_count: u32) -> Self {
        Self {
            error_count,
            ..Self::new(AlertKind::ToleranceExceeded)
        }
    }

    /// Alert classification.
    #[inline]
    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    /// Fixed root cause for this kind.
    #[inline]
    pub fn cause(&self) -> Cause {
        self.kind.cause()
    }

    /// Error counter snapshot; meaningful only for `ToleranceExceeded`, `0` otherwise.
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Recovered panic; present only for `PanicDetected`.
    #[inline]
    pub fn payload(&self) -> Option<&PanicPayload> {
        self.payload.as_deref()
    }

    /// Name of the supervised task, absent for `ToleranceExceeded`.
    #[inline]
    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// Teardown timeout that elapsed; present only for `CancellationNonCompliant`.
    #[inline]
    pub fn grace(&self) -> Option<Duration> {
        self.grace
    }

    /// Globally unique, monotonically increasing sequence number.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wall-clock construction time.
    #[inline]
    pub fn at(&self) -> SystemTime {
        self.at
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.cause())?;
        if let Some(task) = &self.task {
            write!(f, " task={task:?}")?;
        }
        match self.kind {
            AlertKind::PanicDetected => {
                let msg = self.payload().and_then(PanicPayload::message);
                write!(f, " panic={:?}", msg.unwrap_or("<non-string payload>"))
            }
            AlertKind::CancellationNonCompliant => {
                write!(f, " grace={:?}", self.grace.unwrap_or_default())
            }
            AlertKind::ToleranceExceeded => write!(f, " error_count={}", self.error_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_extracts_str_message() {
        let payload = PanicPayload::new(Box::new("boom"));
        assert_eq!(payload.message(), Some("boom"));
    }

    #[test]
    fn test_panic_payload_extracts_string_message() {
        let payload = PanicPayload::new(Box::new(String::from("formatted 42")));
        assert_eq!(payload.message(), Some("formatted 42"));
    }

    #[test]
    fn test_panic_payload_raw_taken_once() {
        let payload = PanicPayload::new(Box::new(7_u32));
        assert_eq!(payload.message(), None);

        let raw = payload.take_raw().expect("raw payload present");
        assert_eq!(raw.downcast_ref::<u32>(), Some(&7));
        assert!(payload.take_raw().is_none());
    }

    #[test]
    fn test_kind_determines_fields() {
        let panic = Alert::panic_detected("worker", PanicPayload::new(Box::new("x")));
        assert_eq!(panic.kind(), AlertKind::PanicDetected);
        assert_eq!(panic.cause(), Cause::TaskPanicked);
        assert_eq!(panic.task(), Some("worker"));
        assert_eq!(panic.error_count(), 0);
        assert!(panic.payload().is_some());
        assert!(panic.grace().is_none());

        let growl = Alert::non_compliant("worker", Duration::from_millis(50));
        assert_eq!(growl.cause(), Cause::NotCancellationCompliant);
        assert_eq!(growl.grace(), Some(Duration::from_millis(50)));
        assert!(growl.payload().is_none());

        let burst = Alert::tolerance_exceeded(4);
        assert_eq!(burst.error_count(), 4);
        assert!(burst.task().is_none());
    }

    #[test]
    fn test_seq_is_monotonic() {
        let a = Alert::tolerance_exceeded(1);
        let b = Alert::tolerance_exceeded(1);
        assert!(b.seq() > a.seq());
    }

    #[test]
    fn test_display() {
        let alert = Alert::non_compliant("db", Duration::from_millis(50));
        assert_eq!(
            alert.to_string(),
            "[cancellation-non-compliant] task not compliant with cancellation task=\"db\" grace=50ms"
        );
        let alert = Alert::tolerance_exceeded(3);
        assert_eq!(
            alert.to_string(),
            "[tolerance-exceeded] tolerance exceeded error_count=3"
        );
    }
}
