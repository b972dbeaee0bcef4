//! # Alert dispatcher: the single consumer loop.
//!
//! Drains the alert queue and hands each alert to the [`Consume`]
//! implementation, awaiting it before taking the next one.
//!
//! ## Rules
//! - Strict FIFO; the consumer is never invoked concurrently with itself.
//! - A panicking consumer is isolated: the panic is logged and the loop continues.
//! - On close the loop stops at once. A consumer call still in progress is
//!   dropped at its next await point, everything still queued is abandoned, and
//!   the queue is closed so late producers fail fast.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    alerts::{Alert, PanicPayload},
    consumers::Consume,
};

/// Runs until `gate` is cancelled or every producer is gone.
pub(crate) async fn run_dispatcher(
    mut rx: mpsc::Receiver<Alert>,
    consumer: Arc<dyn Consume>,
    gate: CancellationToken,
) {
    loop {
        let alert = select! {
            biased;
            _ = gate.cancelled() => break,
            next = rx.recv() => match next {
                Some(alert) => alert,
                None => break,
            },
        };
        select! {
            biased;
            _ = gate.cancelled() => {
                tracing::debug!(
                    consumer = consumer.name(),
                    alert = %alert.kind(),
                    "engine closed: in-flight alert abandoned"
                );
                break;
            }
            _ = deliver(consumer.as_ref(), &alert) => {}
        }
    }

    rx.close();
    tracing::debug!(
        consumer = consumer.name(),
        abandoned = rx.len(),
        "engine closed: stop dispatching alerts"
    );
}

/// Invokes the consumer for one alert, containing any panic.
async fn deliver(consumer: &dyn Consume, alert: &Alert) {
    tracing::trace!(consumer = consumer.name(), alert = %alert.kind(), seq = alert.seq(), "dispatching alert");

    let call = AssertUnwindSafe(consumer.on_alert(alert)).catch_unwind();
    if let Err(panic) = call.await {
        let payload = PanicPayload::new(panic);
        tracing::error!(
            consumer = consumer.name(),
            alert = %alert.kind(),
            panic = payload.message().unwrap_or("<non-string payload>"),
            "consumer panicked; alert lost"
        );
    }
}
