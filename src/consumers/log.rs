//! # LogWriter: tracing-backed alert consumer
//!
//! A minimal consumer that forwards every [`Alert`] to `tracing`.
//! Useful for demos and as a default when no other consumer is wired.
//!
//! ## Example output
//! ```text
//! WARN taskwarden: alert kind=panic-detected task="worker" panic="boom" seq=3
//! WARN taskwarden: alert kind=cancellation-non-compliant task="db" grace=50ms seq=4
//! ERROR taskwarden: alert kind=tolerance-exceeded error_count=3 seq=5
//! ```

use async_trait::async_trait;

use crate::alerts::{Alert, AlertKind, PanicPayload};
use crate::consumers::Consume;

/// Alert writer consumer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Consume for LogWriter {
    async fn on_alert(&self, a: &Alert) {
        match a.kind() {
            AlertKind::PanicDetected => {
                let panic = a.payload().and_then(PanicPayload::message);
                tracing::warn!(
                    target: "taskwarden",
                    kind = %a.kind(),
                    task = a.task().unwrap_or("unknown"),
                    panic = panic.unwrap_or("<non-string payload>"),
                    seq = a.seq(),
                    "alert"
                );
            }
            AlertKind::CancellationNonCompliant => {
                tracing::warn!(
                    target: "taskwarden",
                    kind = %a.kind(),
                    task = a.task().unwrap_or("unknown"),
                    grace = ?a.grace(),
                    seq = a.seq(),
                    "alert"
                );
            }
            AlertKind::ToleranceExceeded => {
                tracing::error!(
                    target: "taskwarden",
                    kind = %a.kind(),
                    error_count = a.error_count(),
                    seq = a.seq(),
                    "alert"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
