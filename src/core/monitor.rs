//! # Tolerance monitor: periodic error-burst detection.
//!
//! Samples the shared [`ErrorCounter`] once per tolerance window. Bursts are a
//! property of the whole engine's error rate, not of any single task.
//!
//! ```text
//! every window:
//!   snapshot = counter
//!   ├─ snapshot <  cap ─► nothing (errors keep accumulating across windows)
//!   └─ snapshot >= cap ─► counter := 0, emit ToleranceExceeded{error_count}
//! ```
//!
//! The reset is a single atomic swap, so the reported `error_count` is the
//! exact value removed from the counter (always `>= cap`). The loop exits on
//! the engine close gate; the interval is dropped with it.

use std::time::Duration;

use tokio::{
    select,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    alerts::{Alert, AlertChannel},
    core::counter::ErrorCounter,
};

/// Periodic tolerance evaluation loop.
pub(crate) struct ToleranceMonitor {
    pub(crate) window: Duration,
    pub(crate) cap: u32,
    pub(crate) counter: ErrorCounter,
    pub(crate) alerts: AlertChannel,
}

impl ToleranceMonitor {
    /// Runs until `gate` is cancelled.
    ///
    /// The first evaluation happens one full window after start.
    pub(crate) async fn run(self, gate: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + self.window, self.window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                biased;
                _ = gate.cancelled() => {
                    tracing::debug!("engine closed: stop monitoring tolerance");
                    return;
                }
                _ = ticker.tick() => {
                    if let Some(alert) = self.evaluate() {
                        self.alerts.emit(alert).await;
                    }
                }
            }
        }
    }

    /// One tick: returns the burst alert if the cap was reached.
    fn evaluate(&self) -> Option<Alert> {
        let snapshot = self.counter.snapshot();
        tracing::trace!(error_count = snapshot, cap = self.cap, "sampling tolerance");
        if snapshot < self.cap {
            return None;
        }

        let drained = self.counter.drain();
        tracing::warn!(error_count = drained, cap = self.cap, "tolerance exceeded");
        Some(Alert::tolerance_exceeded(drained))
    }
}
