//! # Shared error counter.
//!
//! The only state mutated by many actors at once: every task supervisor
//! increments it, the tolerance monitor samples and resets it. All access is
//! atomic; there is no read-modify-write outside of a single atomic op.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Cloneable handle to one atomic error counter.
#[derive(Clone, Debug, Default)]
pub(crate) struct ErrorCounter {
    inner: Arc<AtomicU32>,
}

impl ErrorCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one error and returns the new count.
    pub(crate) fn increment(&self) -> u32 {
        self.inner.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Current count.
    pub(crate) fn snapshot(&self) -> u32 {
        self.inner.load(Ordering::Acquire)
    }

    /// Resets the count to zero and returns what it held.
    pub(crate) fn drain(&self) -> u32 {
        self.inner.swap(0, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_drain() {
        let c = ErrorCounter::new();
        assert_eq!(c.increment(), 1);
        assert_eq!(c.increment(), 2);
        assert_eq!(c.snapshot(), 2);
        assert_eq!(c.drain(), 2);
        assert_eq!(c.snapshot(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let c = ErrorCounter::new();
        let mut handles = Vec::new();
        for _ in 0..64 {
            let c = c.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..1_000 {
                    c.increment();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for h in handles {
            h.await.expect("incrementer panicked");
        }
        assert_eq!(c.snapshot(), 64_000);
    }
}
