//! # Alert consumer trait.
//!
//! Provides [`Consume`], the extension point through which alerts leave the
//! engine (loggers, metrics, incident responders, ...).
//!
//! ## Architecture
//! ```text
//! AlertChannel ──► [bounded queue] ──► dispatcher ──► consumer.on_alert(&Alert)
//!                                                  └─► panic caught → logged, next alert
//! ```
//!
//! ## Rules
//! - Alerts are delivered one at a time, in queue (FIFO) order.
//! - The dispatcher awaits `on_alert` before taking the next alert, so a
//!   consumer is never re-entered concurrently with itself.
//! - A slow consumer backs the queue up; producers then drop alerts after
//!   the configured delivery timeout. It never stalls task supervision.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskwarden::{Alert, AlertKind, Consume};
//!
//! struct Pager;
//!
//! #[async_trait]
//! impl Consume for Pager {
//!     async fn on_alert(&self, alert: &Alert) {
//!         if alert.kind() == AlertKind::ToleranceExceeded {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "pager" }
//! }
//! ```

use async_trait::async_trait;

use crate::alerts::Alert;

/// Receiver of every alert the engine manages to deliver.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally. Panics are caught and logged, but the alert is lost.
#[async_trait]
pub trait Consume: Send + Sync + 'static {
    /// Handles a single alert.
    ///
    /// Called from the dispatcher task, never from a task supervisor.
    async fn on_alert(&self, alert: &Alert);

    /// Returns the consumer name used in logs.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
