//! # Engine: composition root of the watchdog.
//!
//! The [`Engine`] owns the configuration, the shared error counter, the alert
//! channel and the lifecycle gate. It starts the two background loops and
//! launches a [`TaskSupervisor`] race for every supervised invocation.
//!
//! ## High-level architecture
//! ```text
//! caller ── supervise(token, task) ──► TaskSupervisor
//!                                        ├─ guarded run   (panic → errors+1, PanicDetected)
//!                                        └─ teardown race (grace expired → errors+1, NonCompliant)
//!                                                   │
//!                 ToleranceMonitor ─────────────────┤  emit (delivered / timed out / closed)
//!                 (every window: errors >= cap      ▼
//!                  → errors := 0, ToleranceExceeded) AlertChannel ──► dispatcher ──► Consume::on_alert
//!
//! watch(): Created → Watching, spawns ToleranceMonitor + dispatcher
//! close(): Watching → Closed, cancels the close gate observed by every loop and emit
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{AlertHistory, Config, Engine, SupervisionState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let history = Arc::new(AlertHistory::new());
//!     let engine = Engine::builder(Config::default())
//!         .with_consumer(history.clone())
//!         .build()?;
//!     engine.watch()?;
//!
//!     let token = CancellationToken::new();
//!     let run = engine.supervise_fn(token.clone(), "ticker", |ctx: CancellationToken| async move {
//!         while !ctx.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(5)).await;
//!         }
//!     });
//!
//!     token.cancel();
//!     assert_eq!(run.settled().await, SupervisionState::Completed);
//!
//!     engine.close();
//!     engine.closed().await;
//!     assert!(history.is_empty());
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    builder::EngineBuilder,
    counter::ErrorCounter,
    dispatcher::run_dispatcher,
    lifecycle::{Lifecycle, LifecycleState},
    monitor::ToleranceMonitor,
    supervisor::{Supervision, TaskSupervisor},
};
use crate::{
    alerts::{Alert, AlertChannel},
    config::Config,
    consumers::Consume,
    error::{ConfigError, LifecycleError},
    tasks::{TaskFn, TaskRef},
};

/// Watchdog for untrusted async tasks.
///
/// ### Responsibilities
/// - **Supervision**: panics and cancellation non-compliance become alerts
/// - **Aggregation**: error bursts above the tolerance cap become alerts
/// - **Delivery**: bounded, lossy, non-blocking hand-off to one consumer
///
/// ### Rules
/// - `watch` must be called once, from inside a tokio runtime, before tasks are supervised;
///   alerts produced earlier wait in the queue until then
/// - `close` is idempotent; after it every alert is dropped without waiting
/// - dropping the engine closes it
pub struct Engine {
    cfg: Config,
    consumer: Arc<dyn Consume>,
    counter: ErrorCounter,
    alerts: AlertChannel,
    lifecycle: Lifecycle,
    supervisor: TaskSupervisor,
    rx: Mutex<Option<mpsc::Receiver<Alert>>>,
    /// Cancelled once both loops have exited, or on close if they never started.
    stopped: CancellationToken,
}

impl Engine {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: Config) -> EngineBuilder {
        EngineBuilder::new(cfg)
    }

    /// Validates `cfg` and builds an engine delivering to `consumer`.
    pub fn new(cfg: Config, consumer: Arc<dyn Consume>) -> Result<Self, ConfigError> {
        Self::builder(cfg).with_consumer(consumer).build()
    }

    pub(crate) fn new_internal(
        cfg: Config,
        consumer: Arc<dyn Consume>,
    ) -> Result<Self, ConfigError> {
        let lifecycle = Lifecycle::new();
        let counter = ErrorCounter::new();
        let (alerts, rx) = AlertChannel::new(
            cfg.alert_capacity,
            cfg.delivery_timeout,
            lifecycle.gate().clone(),
        )?;
        let supervisor = TaskSupervisor::new(counter.clone(), alerts.clone(), cfg.teardown_timeout);

        Ok(Self {
            cfg,
            consumer,
            counter,
            alerts,
            lifecycle,
            supervisor,
            rx: Mutex::new(Some(rx)),
            stopped: CancellationToken::new(),
        })
    }

    /// Starts the tolerance monitor and the alert dispatcher.
    ///
    /// Fails with [`LifecycleError::AlreadyWatching`] on a second call and with
    /// [`LifecycleError::Closed`] after [`Engine::close`].
    pub fn watch(&self) -> Result<(), LifecycleError> {
        self.lifecycle.start()?;

        let Some(rx) = self.rx.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return Err(LifecycleError::AlreadyWatching);
        };
        let gate = self.lifecycle.gate().clone();

        let monitor = ToleranceMonitor {
            window: self.cfg.tolerance_window,
            cap: self.cfg.tolerance_cap,
            counter: self.counter.clone(),
            alerts: self.alerts.clone(),
        };
        let monitor = tokio::spawn(monitor.run(gate.clone()));
        let dispatcher = tokio::spawn(run_dispatcher(rx, Arc::clone(&self.consumer), gate));

        let stopped = self.stopped.clone();
        tokio::spawn(async move {
            for (name, handle) in [("tolerance-monitor", monitor), ("dispatcher", dispatcher)] {
                if let Err(err) = handle.await {
                    tracing::warn!(task = name, error = %err, "background loop failed");
                }
            }
            stopped.cancel();
        });

        tracing::info!(
            consumer = self.consumer.name(),
            tolerance_window = ?self.cfg.tolerance_window,
            tolerance_cap = self.cfg.tolerance_cap,
            teardown_timeout = ?self.cfg.teardown_timeout,
            "watchdog watching"
        );
        Ok(())
    }

    /// Closes the engine: both loops stop and further alerts are dropped.
    ///
    /// Does not wait; see [`Engine::closed`]. Calling it again is a no-op.
    pub fn close(&self) {
        let Some(prev) = self.lifecycle.close() else {
            return;
        };
        if prev == LifecycleState::Created {
            // No loops to wait for.
            self.stopped.cancel();
        }
        tracing::info!(error_count = self.counter.snapshot(), "watchdog closed");
    }

    /// Waits until the engine is closed and both background loops have exited.
    ///
    /// A consumer call in progress at close time is abandoned, not awaited.
    /// Any number of callers may wait concurrently.
    pub async fn closed(&self) {
        self.stopped.cancelled().await;
    }

    /// Runs `task` under supervision with cancellation context `ctx`.
    ///
    /// Returns as soon as the task is launched. The returned [`Supervision`]
    /// can be ignored; it only exposes the state of this invocation.
    pub fn supervise(&self, ctx: CancellationToken, task: TaskRef) -> Supervision {
        match self.lifecycle.state() {
            LifecycleState::Created => {
                tracing::debug!(task = task.name(), "supervising before watch: alerts are queued")
            }
            LifecycleState::Closed => {
                tracing::debug!(task = task.name(), "supervising after close: alerts are dropped")
            }
            LifecycleState::Watching => {}
        }
        self.supervisor.supervise(ctx, task)
    }

    /// Shorthand for [`Engine::supervise`] with a [`TaskFn`] built from `f`.
    pub fn supervise_fn<F, Fut>(
        &self,
        ctx: CancellationToken,
        name: &'static str,
        f: F,
    ) -> Supervision
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.supervise(ctx, TaskFn::arc(name, f))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Errors accumulated since the last tolerance breach.
    pub fn error_count(&self) -> u32 {
        self.counter.snapshot()
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}
