//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a named unit of async work that
//! receives a [`CancellationToken`] and is expected to return promptly once the
//! token is cancelled. The engine cannot force a task to stop; a task that
//! ignores its token is reported, not killed.

use std::{future::Future, pin::Pin};

use tokio_util::sync::CancellationToken;

/// Boxed future produced by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// # Asynchronous, cancelable unit.
///
/// A `Task` has a stable [`name`](Task::name) and produces a fresh future per
/// [`spawn`](Task::spawn). The future owns everything it needs (`'static`).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use taskwarden::{BoxTaskFuture, Task};
///
/// struct Poller;
///
/// impl Task for Poller {
///     fn name(&self) -> &str { "poller" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             while !ctx.is_cancelled() {
///                 tokio::time::sleep(Duration::from_millis(10)).await;
///             }
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name (used in alerts and logs).
    fn name(&self) -> &str;

    /// Creates the future for one supervised run.
    ///
    /// The future should observe `ctx` and finish quickly once it is cancelled.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
