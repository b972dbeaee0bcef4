//! # AlertHistory: in-memory alert recorder
//!
//! [`AlertHistory`] keeps every delivered [`Alert`] in arrival order. It is the
//! consumer used by the crate's own tests and is handy for assertions in
//! downstream test suites:
//!
//! ```rust
//! use std::sync::Arc;
//! use taskwarden::{AlertHistory, AlertKind};
//!
//! let history = Arc::new(AlertHistory::new());
//! // ... build an engine with `history.clone()` as consumer ...
//! assert!(history.diff_kinds(&[]).is_ok());
//! assert!(history.last().is_none());
//! ```

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

use crate::alerts::{Alert, AlertKind};
use crate::consumers::Consume;

/// Difference between recorded alerts and an expected kind sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryMismatch {
    /// Fewer alerts were recorded than expected.
    #[error("missing expected alerts: expected {expected}, got {got}")]
    Missing { expected: usize, got: usize },

    /// More alerts were recorded than expected.
    #[error("more alerts than expected: expected {expected}, got {got}")]
    Unexpected { expected: usize, got: usize },

    /// Same length, but kinds differ at the listed positions as `(index, want, got)`.
    #[error("alert kinds mismatch: {0:?}")]
    Kinds(Vec<(usize, AlertKind, AlertKind)>),
}

/// Consumer that records alerts in delivery order.
#[derive(Default)]
pub struct AlertHistory {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Vec<Alert>) -> R) -> R {
        let mut guard = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// Copy of all recorded alerts.
    pub fn alerts(&self) -> Vec<Alert> {
        self.with(|a| a.clone())
    }

    /// Kinds of all recorded alerts, in delivery order.
    pub fn kinds(&self) -> Vec<AlertKind> {
        self.with(|a| a.iter().map(Alert::kind).collect())
    }

    /// Most recently recorded alert.
    pub fn last(&self) -> Option<Alert> {
        self.with(|a| a.last().cloned())
    }

    /// Number of recorded alerts.
    pub fn len(&self) -> usize {
        self.with(|a| a.len())
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded alerts of `kind`.
    pub fn count(&self, kind: AlertKind) -> usize {
        self.with(|a| a.iter().filter(|x| x.kind() == kind).count())
    }

    /// Compares the recorded kinds, position by position, with `expected`.
    pub fn diff_kinds(&self, expected: &[AlertKind]) -> Result<(), HistoryMismatch> {
        let got = self.kinds();
        if got.len() < expected.len() {
            return Err(HistoryMismatch::Missing {
                expected: expected.len(),
                got: got.len(),
            });
        }
        if got.len() > expected.len() {
            return Err(HistoryMismatch::Unexpected {
                expected: expected.len(),
                got: got.len(),
            });
        }

        let mismatches: Vec<_> = expected
            .iter()
            .zip(got.iter())
            .enumerate()
            .filter(|(_, (want, got))| want != got)
            .map(|(i, (want, got))| (i, *want, *got))
            .collect();
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(HistoryMismatch::Kinds(mismatches))
        }
    }
}

#[async_trait]
impl Consume for AlertHistory {
    async fn on_alert(&self, alert: &Alert) {
        self.with(|a| a.push(alert.clone()));
    }

    fn name(&self) -> &'static str {
        "AlertHistory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_records_in_order() {
        let history = AlertHistory::new();
        history
            .on_alert(&Alert::non_compliant("a", Duration::from_millis(5)))
            .await;
        history.on_alert(&Alert::tolerance_exceeded(2)).await;

        assert_eq!(history.len(), 2);
        assert_eq!(history.count(AlertKind::ToleranceExceeded), 1);
        assert_eq!(
            history.last().map(|a| a.kind()),
            Some(AlertKind::ToleranceExceeded)
        );
        assert_eq!(
            history.diff_kinds(&[
                AlertKind::CancellationNonCompliant,
                AlertKind::ToleranceExceeded
            ]),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_diff_reports_mismatches() {
        let history = AlertHistory::new();
        history.on_alert(&Alert::tolerance_exceeded(2)).await;

        assert_eq!(
            history.diff_kinds(&[]),
            Err(HistoryMismatch::Unexpected {
                expected: 0,
                got: 1
            })
        );
        assert_eq!(
            history.diff_kinds(&[AlertKind::PanicDetected, AlertKind::PanicDetected]),
            Err(HistoryMismatch::Missing {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            history.diff_kinds(&[AlertKind::PanicDetected]),
            Err(HistoryMismatch::Kinds(vec![(
                0,
                AlertKind::PanicDetected,
                AlertKind::ToleranceExceeded
            )]))
        );
    }
}
