//! # taskwarden
//!
//! **Taskwarden** is a watchdog for async tasks a process spawns but cannot
//! trust to behave: tasks that may panic, ignore cancellation, or fail in bursts.
//!
//! It wraps each task, classifies how it failed, aggregates error bursts over a
//! tolerance window and reports structured [`Alert`]s to a pluggable consumer,
//! without blocking the caller and without leaking its own background tasks.
//! It cannot preempt a misbehaving task; it only detects and reports it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    TaskRef   │   │    TaskRef   │   │    TaskRef   │
//!     │  + token #1  │   │  + token #2  │   │  + token #3  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (composition root)                                        │
//! │  - Config (validated, read-only)                                  │
//! │  - ErrorCounter (atomic, shared)                                  │
//! │  - AlertChannel (bounded queue, best-effort emit)                 │
//! │  - Lifecycle (Created → Watching → Closed, close gate)            │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │TaskSupervisor│   │TaskSupervisor│   │TaskSupervisor│   │
//!     │ guarded run  │   │ guarded run  │   │ guarded run  │   │
//!     │ + teardown   │   │ + teardown   │   │ + teardown   │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ PanicDetected    │ NonCompliant     │                 │ ToleranceMonitor
//!      │                  │                  │                 │ (every window)
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │            AlertChannel (capacity: Config::alert_capacity)        │
//! │     enqueue ∥ delivery timeout ∥ engine closed → Delivery         │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │       dispatcher       │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                         Consume::on_alert(&Alert)
//! ```
//!
//! ### Per-invocation race
//! ```text
//! supervise(token, task)
//!   ├─► spawn guarded run: catch_unwind(task.spawn(token))
//!   │       └─ panic ──► errors += 1, emit PanicDetected
//!   └─► spawn teardown race:
//!           ├─ task done first        ─► Completed (silent)
//!           └─ token cancelled ─► CancelRequested
//!                   ├─ done within teardown_timeout ─► Completed (silent)
//!                   └─ timeout ─► errors += 1, emit CancellationNonCompliant ─► GraceExpired
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Panic capture and cancellation-compliance checks per task.    | [`Engine`], [`Supervision`]                |
//! | **Alerts**        | Immutable records with a fixed cause per kind.                | [`Alert`], [`AlertKind`], [`Cause`]        |
//! | **Delivery**      | Bounded, lossy, non-blocking queue with a single consumer.    | [`AlertChannel`], [`Delivery`], [`Consume`]|
//! | **Tasks**         | Tasks as trait objects or closures.                           | [`Task`], [`TaskFn`], [`TaskRef`]          |
//! | **Configuration** | Validated bounds, fail fast on construction.                  | [`Config`], [`ConfigError`]                |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a consumer that writes alerts through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{AlertHistory, AlertKind, Config, Engine, SupervisionState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let history = Arc::new(AlertHistory::new());
//!     let engine = Engine::new(Config::default(), history.clone())?;
//!     engine.watch()?;
//!
//!     // A task that ignores its token.
//!     let token = CancellationToken::new();
//!     let run = engine.supervise_fn(token.clone(), "stubborn", |_ctx: CancellationToken| async {
//!         tokio::time::sleep(Duration::from_millis(300)).await;
//!     });
//!     token.cancel();
//!
//!     assert_eq!(run.settled().await, SupervisionState::GraceExpired);
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     assert_eq!(history.kinds(), vec![AlertKind::CancellationNonCompliant]);
//!
//!     engine.close();
//!     Ok(())
//! }
//! ```
mod alerts;
mod config;
mod consumers;
mod core;
mod error;
mod tasks;

// ---- Public re-exports ----

pub use alerts::{Alert, AlertChannel, AlertKind, Delivery, PanicPayload};
pub use config::*;
pub use consumers::{AlertHistory, Consume, HistoryMismatch};
pub use crate::core::{Engine, EngineBuilder, LifecycleState, Supervision, SupervisionState};
pub use error::{Cause, ConfigError, LifecycleError};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef};

// Optional: expose a tracing-backed built-in consumer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use consumers::LogWriter;
