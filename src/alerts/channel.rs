//! # Bounded alert channel with best-effort delivery.
//!
//! [`AlertChannel`] is the producer side of a fixed-capacity
//! [`tokio::sync::mpsc`] queue. It decouples alert producers (task supervisors,
//! the tolerance monitor) from the single dispatcher that feeds the consumer.
//!
//! ## Architecture
//! ```text
//! Producers (many):                       Consumer side (one):
//!   TaskSupervisor ──┐
//!   TaskSupervisor ──┼──► AlertChannel ──► [bounded queue] ──► dispatcher ──► Consume::on_alert
//!   ToleranceMonitor ┘     (emit: race)
//! ```
//!
//! ## Rules
//! Every [`AlertChannel::emit`] is a three-way race:
//! - the alert is enqueued → [`Delivery::Delivered`];
//! - the queue stays full for `delivery_timeout` → [`Delivery::TimedOut`], alert dropped;
//! - the engine closes first (or was already closed) → [`Delivery::Closed`], alert dropped.
//!
//! Dropped alerts are a normal outcome, not an error: liveness of the producers
//! wins over completeness of the alert stream. Nothing is retried.

use std::time::Duration;

use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use super::alert::Alert;
use crate::{
    config::{MAX_ALERT_CAPACITY, MIN_ALERT_CAPACITY},
    error::ConfigError,
};

/// Outcome of a single [`AlertChannel::emit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The alert was enqueued for the dispatcher.
    Delivered,
    /// The queue stayed full for the whole delivery timeout; the alert was dropped.
    TimedOut,
    /// The engine is closed; the alert was dropped without waiting.
    Closed,
}

impl Delivery {
    /// True if the alert reached the queue.
    #[inline]
    pub fn is_delivered(self) -> bool {
        matches!(self, Delivery::Delivered)
    }

    /// Returns a short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Delivery::Delivered => "delivered",
            Delivery::TimedOut => "timed_out",
            Delivery::Closed => "closed",
        }
    }
}

/// Producer handle of the bounded alert queue.
///
/// Cheap to clone; all clones share the same queue and close gate.
#[derive(Clone, Debug)]
pub struct AlertChannel {
    tx: mpsc::Sender<Alert>,
    gate: CancellationToken,
    delivery_timeout: Duration,
}

impl AlertChannel {
    /// Creates a channel of `capacity` slots and returns its receiving end.
    ///
    /// `gate` is the engine close signal: once cancelled, every emit drops immediately.
    /// The capacity is fixed for the lifetime of the channel and must lie within
    /// the bounds [`Config::validate`](crate::Config::validate) enforces.
    pub fn new(
        capacity: usize,
        delivery_timeout: Duration,
        gate: CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<Alert>), ConfigError> {
        if !(MIN_ALERT_CAPACITY..=MAX_ALERT_CAPACITY).contains(&capacity) {
            return Err(ConfigError::count(
                "alert_capacity",
                capacity as u64,
                MIN_ALERT_CAPACITY as u64,
                MAX_ALERT_CAPACITY as u64,
            ));
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok((
            Self {
                tx,
                gate,
                delivery_timeout,
            },
            rx,
        ))
    }

    /// Tries to enqueue `alert`, waiting at most the delivery timeout.
    ///
    /// Never blocks longer than `delivery_timeout`, and does not wait at all
    /// once the close gate is cancelled.
    pub async fn emit(&self, alert: Alert) -> Delivery {
        let kind = alert.kind();
        if self.gate.is_cancelled() {
            tracing::debug!(alert = %kind, "engine closed: alert dropped");
            return Delivery::Closed;
        }

        let outcome = select! {
            biased;
            _ = self.gate.cancelled() => Delivery::Closed,
            res = time::timeout(self.delivery_timeout, self.tx.send(alert)) => match res {
                Ok(Ok(())) => Delivery::Delivered,
                // Receiver gone: the dispatcher is no longer running.
                Ok(Err(_)) => Delivery::Closed,
                Err(_elapsed) => Delivery::TimedOut,
            },
        };

        match outcome {
            Delivery::Delivered => tracing::debug!(alert = %kind, "alert enqueued"),
            Delivery::TimedOut => tracing::warn!(
                alert = %kind,
                timeout = ?self.delivery_timeout,
                "alert queue full: alert dropped"
            ),
            Delivery::Closed => tracing::debug!(alert = %kind, "engine closed: alert dropped"),
        }
        outcome
    }

    /// Fixed capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
