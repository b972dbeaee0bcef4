//! # TaskSupervisor: per-invocation watchdog around one task.
//!
//! Every call to [`Engine::supervise`](crate::Engine::supervise) spawns two tokio tasks:
//! - the **guarded run**: the task future wrapped in `catch_unwind`, so a panic
//!   is recovered right where it happens and turned into a `PanicDetected` alert;
//! - the **teardown race**: waits for either completion or cancellation, then
//!   gives the task the teardown timeout to finish.
//!
//! ## State machine
//! ```text
//!            completion
//! Running ───────────────────────────────────────────► Completed   (silent)
//!    │
//!    │ token cancelled
//!    ▼                 completion within grace
//! CancelRequested ───────────────────────────────────► Completed   (silent)
//!    │
//!    │ teardown timeout elapsed
//!    ▼
//! GraceExpired  (errors += 1, CancellationNonCompliant alert)
//!    └─► the task keeps running detached; nothing tracks it any more
//! ```
//!
//! ## Rules
//! - A task that completes before its token is cancelled never produces an alert.
//! - The race produces at most one alert, strictly after the teardown timeout.
//! - The race sees the task as finished as soon as it returns or panics, before
//!   the panic alert is emitted. A slow alert queue never turns a panic into a
//!   non-compliance report.
//! - Panic recovery is independent of the race: a task that outlives its grace
//!   period and panics afterwards reports both alerts.
//! - Nothing here blocks the caller past spawning the two tokio tasks.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{
    select,
    sync::{oneshot, watch},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    alerts::{Alert, AlertChannel, PanicPayload},
    core::counter::ErrorCounter,
    tasks::TaskRef,
};

/// Position of one supervised invocation in its teardown race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionState {
    /// Task launched, token not cancelled yet.
    Running,
    /// Token cancelled; the teardown timer is running.
    CancelRequested,
    /// Teardown timeout elapsed before the task finished. Terminal: the task leaked.
    GraceExpired,
    /// Task finished (normally or by panic) before any deadline. Terminal.
    Completed,
}

impl SupervisionState {
    /// True once the race is decided.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SupervisionState::GraceExpired | SupervisionState::Completed
        )
    }
}

/// Handle to one supervised invocation.
///
/// Dropping it changes nothing: supervision is fire-and-forget.
#[derive(Debug, Clone)]
pub struct Supervision {
    task: Arc<str>,
    state: watch::Receiver<SupervisionState>,
}

impl Supervision {
    /// Name of the supervised task.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Current state of the race.
    pub fn state(&self) -> SupervisionState {
        *self.state.borrow()
    }

    /// Waits until the race is decided and returns the terminal state.
    ///
    /// On `GraceExpired` the non-compliance alert was already handed to the
    /// alert channel (delivered or dropped). A panic alert may still be pending.
    pub async fn settled(&self) -> SupervisionState {
        let mut rx = self.state.clone();
        let res = rx.wait_for(|s| s.is_terminal()).await.map(|s| *s);
        match res {
            Ok(state) => state,
            // Race task is gone (runtime shutting down): report what was last seen.
            Err(_) => *rx.borrow(),
        }
    }
}

/// Launches and watches individual task invocations.
#[derive(Clone)]
pub(crate) struct TaskSupervisor {
    counter: ErrorCounter,
    alerts: AlertChannel,
    teardown: Duration,
}

impl TaskSupervisor {
    pub(crate) fn new(counter: ErrorCounter, alerts: AlertChannel, teardown: Duration) -> Self {
        Self {
            counter,
            alerts,
            teardown,
        }
    }

    /// Spawns `task` with `ctx` and its teardown race; returns immediately.
    pub(crate) fn supervise(&self, ctx: CancellationToken, task: TaskRef) -> Supervision {
        let name: Arc<str> = Arc::from(task.name());
        tracing::debug!(task = %name, "launching supervised task");

        let (state_tx, state_rx) = watch::channel(SupervisionState::Running);
        let (finished_tx, finished_rx) = oneshot::channel();
        tokio::spawn(self.clone().guarded_run(task, ctx.clone(), name.clone(), finished_tx));
        tokio::spawn(self.clone().teardown_race(finished_rx, ctx, name.clone(), state_tx));

        Supervision {
            task: name,
            state: state_rx,
        }
    }

    /// Runs the task, recovering a panic into a `PanicDetected` alert.
    ///
    /// `finished` fires once the task is over, before any alert is emitted.
    async fn guarded_run(
        self,
        task: TaskRef,
        ctx: CancellationToken,
        name: Arc<str>,
        finished: oneshot::Sender<()>,
    ) {
        // `spawn` is called inside the guard so a panicking constructor is caught too.
        let run = AssertUnwindSafe(async move { task.spawn(ctx).await }).catch_unwind();

        let panic = match run.await {
            Ok(()) => {
                tracing::debug!(task = %name, "task completed");
                None
            }
            Err(panic) => {
                let payload = PanicPayload::new(panic);
                let errors = self.counter.increment();
                tracing::warn!(
                    task = %name,
                    panic = payload.message().unwrap_or("<non-string payload>"),
                    error_count = errors,
                    "recovered from task panic"
                );
                Some(payload)
            }
        };

        // The race may already be over (grace expired); nobody listens then.
        let _ = finished.send(());
        if let Some(payload) = panic {
            self.alerts.emit(Alert::panic_detected(name, payload)).await;
        }
    }

    /// Races completion against cancellation, then against the teardown timeout.
    async fn teardown_race(
        self,
        mut done: oneshot::Receiver<()>,
        ctx: CancellationToken,
        name: Arc<str>,
        state: watch::Sender<SupervisionState>,
    ) {
        select! {
            biased;
            _ = &mut done => {
                tracing::debug!(task = %name, "task completed before cancellation");
                state.send_replace(SupervisionState::Completed);
                return;
            }
            _ = ctx.cancelled() => {}
        }

        state.send_replace(SupervisionState::CancelRequested);

        match time::timeout(self.teardown, &mut done).await {
            Ok(_) => {
                tracing::debug!(task = %name, "task completed within teardown timeout");
                state.send_replace(SupervisionState::Completed);
            }
            Err(_elapsed) => {
                let errors = self.counter.increment();
                tracing::warn!(
                    task = %name,
                    grace = ?self.teardown,
                    error_count = errors,
                    "task teardown timeout: not compliant with cancellation"
                );
                self.alerts
                    .emit(Alert::non_compliant(name, self.teardown))
                    .await;
                state.send_replace(SupervisionState::GraceExpired);
                // Nothing tracks the task from here on; it keeps running detached.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::tasks::TaskFn;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    const GRACE: Duration = Duration::from_millis(50);

    fn supervisor() -> (TaskSupervisor, ErrorCounter, mpsc::Receiver<Alert>) {
        let counter = ErrorCounter::new();
        let (alerts, rx) =
            AlertChannel::new(16, Duration::from_millis(10), CancellationToken::new())
                .expect("valid capacity");
        (TaskSupervisor::new(counter.clone(), alerts, GRACE), counter, rx)
    }

    fn stubborn(run_for: Duration) -> TaskRef {
        TaskFn::arc("stubborn", move |_ctx: CancellationToken| async move {
            time::sleep(run_for).await;
        })
    }

    fn compliant() -> TaskRef {
        TaskFn::arc("compliant", |ctx: CancellationToken| async move {
            tokio::select! {
                _ = ctx.cancelled() => {}
                _ = time::sleep(Duration::from_secs(1)) => {}
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_before_cancel_is_silent() {
        let (sup, counter, mut rx) = supervisor();
        let ctx = CancellationToken::new();

        let s = sup.supervise(ctx.clone(), stubborn(Duration::from_millis(10)));
        assert_eq!(s.settled().await, SupervisionState::Completed);
        ctx.cancel();

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.snapshot(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_compliant_task_after_cancel_is_silent() {
        let (sup, counter, mut rx) = supervisor();
        let ctx = CancellationToken::new();

        let s = sup.supervise(ctx.clone(), compliant());
        tokio::task::yield_now().await;
        ctx.cancel();

        assert_eq!(s.settled().await, SupervisionState::Completed);
        assert_eq!(counter.snapshot(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_compliant_reported_after_grace() {
        let (sup, counter, mut rx) = supervisor();
        let ctx = CancellationToken::new();

        let s = sup.supervise(ctx.clone(), stubborn(Duration::from_secs(1)));
        tokio::task::yield_now().await;
        assert_eq!(s.state(), SupervisionState::Running);

        let cancelled_at = Instant::now();
        ctx.cancel();

        assert_eq!(s.settled().await, SupervisionState::GraceExpired);
        assert!(cancelled_at.elapsed() >= GRACE);
        assert_eq!(counter.snapshot(), 1);

        let alert = rx.recv().await.expect("alert");
        assert_eq!(alert.kind(), AlertKind::CancellationNonCompliant);
        assert_eq!(alert.task(), Some("stubborn"));
        assert_eq!(alert.grace(), Some(GRACE));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncancelled_stubborn_task_is_silent() {
        let (sup, counter, mut rx) = supervisor();
        let s = sup.supervise(CancellationToken::new(), stubborn(Duration::from_secs(1)));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(s.state(), SupervisionState::Running);
        assert_eq!(counter.snapshot(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_is_contained_and_reported() {
        let (sup, counter, mut rx) = supervisor();
        let task: TaskRef = TaskFn::arc("bomb", |_ctx: CancellationToken| async move {
            panic!("boom");
        });

        let s = sup.supervise(CancellationToken::new(), task);
        assert_eq!(s.settled().await, SupervisionState::Completed);
        assert_eq!(counter.snapshot(), 1);

        let alert = rx.recv().await.expect("alert");
        assert_eq!(alert.kind(), AlertKind::PanicDetected);
        assert_eq!(alert.task(), Some("bomb"));
        let payload = alert.payload().expect("payload");
        assert_eq!(payload.message(), Some("boom"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_in_task_constructor_is_contained() {
        let (sup, counter, mut rx) = supervisor();
        #[allow(unreachable_code)]
        let task: TaskRef = TaskFn::arc("eager", |_ctx: CancellationToken| {
            panic!("before the future exists");
            async {}
        });

        sup.supervise(CancellationToken::new(), task).settled().await;
        assert_eq!(counter.snapshot(), 1);
        assert_eq!(
            rx.recv().await.map(|a| a.kind()),
            Some(AlertKind::PanicDetected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_panic_after_grace_reports_both() {
        let (sup, counter, mut rx) = supervisor();
        let task: TaskRef = TaskFn::arc("late", |_ctx: CancellationToken| async move {
            time::sleep(Duration::from_millis(100)).await;
            panic!("too late");
        });

        let ctx = CancellationToken::new();
        let s = sup.supervise(ctx.clone(), task);
        ctx.cancel();
        assert_eq!(s.settled().await, SupervisionState::GraceExpired);

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.snapshot(), 2);
        assert_eq!(
            rx.recv().await.map(|a| a.kind()),
            Some(AlertKind::CancellationNonCompliant)
        );
        assert_eq!(
            rx.recv().await.map(|a| a.kind()),
            Some(AlertKind::PanicDetected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_after_cancel_on_full_queue_is_not_non_compliant() {
        // Delivery timeout longer than the grace period, queue already full.
        let counter = ErrorCounter::new();
        let (alerts, mut rx) =
            AlertChannel::new(1, Duration::from_millis(500), CancellationToken::new())
                .expect("valid capacity");
        assert!(alerts.emit(Alert::tolerance_exceeded(1)).await.is_delivered());
        let sup = TaskSupervisor::new(counter.clone(), alerts, GRACE);

        let task: TaskRef = TaskFn::arc("quitter", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            panic!("bail out");
        });
        let ctx = CancellationToken::new();
        let s = sup.supervise(ctx.clone(), task);
        tokio::task::yield_now().await;

        let cancelled_at = Instant::now();
        ctx.cancel();
        assert_eq!(s.settled().await, SupervisionState::Completed);
        assert!(cancelled_at.elapsed() < GRACE);

        // The panic alert times out on the full queue; nothing else is produced.
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.snapshot(), 1);
        assert_eq!(s.state(), SupervisionState::Completed);
        assert_eq!(
            rx.recv().await.map(|a| a.kind()),
            Some(AlertKind::ToleranceExceeded)
        );
        assert!(rx.try_recv().is_err());
    }
}
