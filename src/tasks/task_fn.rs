//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per spawn, so the same task value can be supervised many times.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("worker", |ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//! });
//!
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::tasks::task::{BoxTaskFuture, Task};

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((self.f)(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fresh_future_per_spawn() {
        let runs = Arc::new(AtomicUsize::new(0));
        let task: TaskRef = TaskFn::arc("counter", {
            let runs = Arc::clone(&runs);
            move |_ctx: CancellationToken| {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        task.spawn(CancellationToken::new()).await;
        task.spawn(CancellationToken::new()).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(task.name(), "counter");
    }

    #[tokio::test]
    async fn test_future_observes_token() {
        let task = TaskFn::new("waiter", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
        });
        let token = CancellationToken::new();
        token.cancel();
        task.spawn(token).await;
    }
}
