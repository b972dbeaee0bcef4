//! # One-shot engine lifecycle.
//!
//! ```text
//! Created ──watch()──► Watching ──close()──► Closed
//!    └──────────────close()──────────────────┘
//! ```
//!
//! Closure is broadcast through a single [`CancellationToken`] (the close gate)
//! that every background loop and every alert emit selects on. Closing is
//! idempotent: only the first call cancels the gate, later calls are no-ops.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;

use crate::error::LifecycleError;

/// Observable state of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Built, background loops not started.
    Created,
    /// Tolerance monitor and dispatcher are running.
    Watching,
    /// Closed for good; alerts are dropped.
    Closed,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LifecycleState::Created,
            1 => LifecycleState::Watching,
            _ => LifecycleState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LifecycleState::Created => 0,
            LifecycleState::Watching => 1,
            LifecycleState::Closed => 2,
        }
    }
}

/// Lifecycle flag plus the close gate observed by every loop.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
    gate: CancellationToken,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created.as_u8()),
            gate: CancellationToken::new(),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Close gate; cancelled exactly once, on the first `close`.
    pub(crate) fn gate(&self) -> &CancellationToken {
        &self.gate
    }

    /// `Created → Watching`.
    pub(crate) fn start(&self) -> Result<(), LifecycleError> {
        self.state
            .compare_exchange(
                LifecycleState::Created.as_u8(),
                LifecycleState::Watching.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|current| match LifecycleState::from_u8(current) {
                LifecycleState::Closed => LifecycleError::Closed,
                _ => LifecycleError::AlreadyWatching,
            })
    }

    /// Moves to `Closed` and cancels the gate.
    ///
    /// Returns the state it left, or `None` if the lifecycle was already closed.
    pub(crate) fn close(&self) -> Option<LifecycleState> {
        let prev = LifecycleState::from_u8(
            self.state
                .swap(LifecycleState::Closed.as_u8(), Ordering::AcqRel),
        );
        if prev == LifecycleState::Closed {
            return None;
        }
        self.gate.cancel();
        Some(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_way_transitions() {
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), LifecycleState::Created);

        assert_eq!(lc.start(), Ok(()));
        assert_eq!(lc.state(), LifecycleState::Watching);
        assert_eq!(lc.start(), Err(LifecycleError::AlreadyWatching));

        assert_eq!(lc.close(), Some(LifecycleState::Watching));
        assert_eq!(lc.state(), LifecycleState::Closed);
        assert!(lc.gate().is_cancelled());
        assert_eq!(lc.start(), Err(LifecycleError::Closed));
    }

    #[test]
    fn test_double_close_is_noop() {
        let lc = Lifecycle::new();
        lc.start().expect("start");
        assert_eq!(lc.close(), Some(LifecycleState::Watching));
        assert_eq!(lc.close(), None);
        assert_eq!(lc.close(), None);
        assert_eq!(lc.state(), LifecycleState::Closed);
    }

    #[test]
    fn test_close_before_watch() {
        let lc = Lifecycle::new();
        assert_eq!(lc.close(), Some(LifecycleState::Created));
        assert_eq!(lc.start(), Err(LifecycleError::Closed));
    }
}
