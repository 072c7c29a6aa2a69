//! Worker contract and cooperative cancellation
//!
//! Workers are opaque logical tasks supplied by the embedding harness. Each
//! launched worker owns a [`WorkerContext`] that travels with its run future
//! across every resumption on any pool thread, so no thread-local state is
//! involved. Cancellation is cooperative: a stop raises a flag the worker
//! observes at its next checkpoint, while an interrupt additionally fires a
//! registered hook to break an in-flight blocking operation.

use crate::timing;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

type InterruptHook = Box<dyn FnOnce() + Send>;

/// Cooperative cancellation token shared between a worker and its group
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    stopped: AtomicBool,
    notify: Notify,
    hook: Mutex<Option<InterruptHook>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop. Observed at the worker's next checkpoint;
    /// an in-flight operation is not interrupted. Idempotent.
    pub fn stop(&self) {
        if !self.inner.stopped.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested
    pub async fn stopped(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register with the Notify before reading the flag: a Notified
            // future only receives notify_waiters() wakeups once enabled, so
            // enabling first closes the window where a concurrent stop()
            // lands between the flag check and the first poll
            notified.as_mut().enable();
            if self.is_stopped() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }

    /// Register a hook to break the current interruptible operation.
    /// Replaces any previously registered hook; a worker re-registers at
    /// each interruptible boundary and clears with [`clear_interrupt_hook`].
    ///
    /// [`clear_interrupt_hook`]: CancelToken::clear_interrupt_hook
    pub fn on_interrupt(&self, hook: impl FnOnce() + Send + 'static) {
        if let Ok(mut slot) = self.inner.hook.lock() {
            *slot = Some(Box::new(hook));
        }
    }

    /// Drop the registered hook, marking the worker as not interruptible
    pub fn clear_interrupt_hook(&self) {
        if let Ok(mut slot) = self.inner.hook.lock() {
            *slot = None;
        }
    }

    /// Force an interrupt: stop, then fire the registered hook if any.
    ///
    /// Returns whether an in-flight interruptible operation was actually
    /// interrupted (i.e. a hook was registered and ran).
    pub fn interrupt(&self) -> bool {
        self.stop();
        let hook = self.inner.hook.lock().ok().and_then(|mut slot| slot.take());
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

/// Per-logical-task execution context
///
/// Carries the worker's identity, its absolute deadline, and its cancellation
/// token. Passed by value into [`Worker::run`]; because the context is owned
/// by the run future, it is trivially restored wherever the future resumes.
#[derive(Clone)]
pub struct WorkerContext {
    index: usize,
    end_ns: u64,
    cancel: CancelToken,
}

impl WorkerContext {
    pub(crate) fn new(index: usize, end_ns: u64, cancel: CancelToken) -> Self {
        Self { index, end_ns, cancel }
    }

    /// Zero-based launch index of this worker within its group
    pub fn index(&self) -> usize {
        self.index
    }

    /// Absolute schedule deadline on the [`timing::time_ns`] clock
    pub fn end_ns(&self) -> u64 {
        self.end_ns
    }

    pub fn cancel(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether the schedule deadline has passed. Workers check this at
    /// iteration boundaries and self-terminate.
    pub fn deadline_reached(&self) -> bool {
        timing::time_ns() >= self.end_ns
    }

    /// Combined checkpoint: stop requested or deadline passed
    pub fn should_stop(&self) -> bool {
        self.cancel.is_stopped() || self.deadline_reached()
    }

    /// Sleep that doubles as a cancellation checkpoint
    ///
    /// Returns `false` when the sleep was cut short by a stop request, so a
    /// worker loop can simply `while ctx.idle(pace).await { ... }`.
    pub async fn idle(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.should_stop(),
            _ = self.cancel.stopped() => false,
        }
    }
}

/// An opaque unit of load supplied by the embedding harness
///
/// The group only observes completion: a worker converts its own business
/// failures into whatever result signal the harness uses and returns.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Worker identity for logging
    fn name(&self) -> &str;

    /// Execute the worker until completion, stop, or deadline
    async fn run(&self, ctx: WorkerContext);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_stop_is_idempotent_and_visible() {
        let token = CancelToken::new();
        assert!(!token.is_stopped());
        token.stop();
        token.stop();
        assert!(token.is_stopped());
    }

    #[test]
    fn test_interrupt_reports_hook_presence() {
        let token = CancelToken::new();
        assert!(!token.interrupt(), "no hook registered, nothing interrupted");

        let fired = Arc::new(AtomicUsize::new(0));
        let token = CancelToken::new();
        let counter = fired.clone();
        token.on_interrupt(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(token.interrupt());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        // The hook is consumed; a second interrupt finds nothing in flight
        assert!(!token.interrupt());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_interrupt_hook() {
        let token = CancelToken::new();
        token.on_interrupt(|| panic!("must not fire"));
        token.clear_interrupt_hook();
        assert!(!token.interrupt());
    }

    #[tokio::test]
    async fn test_stopped_resolves_when_already_stopped() {
        let token = CancelToken::new();
        token.stop();
        // No further notification will ever come; the waiter must not rely
        // on one arriving after the flag is set
        tokio::time::timeout(Duration::from_secs(1), token.stopped())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_survives_concurrent_stop() {
        // Hammer the stop/wait handoff from separate threads; a waiter that
        // misses the wakeup parks forever and trips the timeout
        for _ in 0..500 {
            let token = CancelToken::new();
            let waiter = token.clone();
            let waiting = tokio::spawn(async move { waiter.stopped().await });
            let stopper = token.clone();
            let stopping = tokio::task::spawn_blocking(move || stopper.stop());
            tokio::time::timeout(Duration::from_secs(5), waiting)
                .await
                .unwrap()
                .unwrap();
            stopping.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_stopped_resolves_for_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.stopped().await;
            true
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.stop();
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_idle_cut_short_by_stop() {
        let cancel = CancelToken::new();
        let ctx = WorkerContext::new(0, u64::MAX, cancel.clone());
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            stopper.stop();
        });
        let started = std::time::Instant::now();
        assert!(!ctx.idle(Duration::from_secs(30)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_idle_completes_without_stop() {
        let ctx = WorkerContext::new(0, u64::MAX, CancelToken::new());
        assert!(ctx.idle(Duration::from_millis(1)).await);
    }

    #[test]
    fn test_deadline() {
        let past = WorkerContext::new(0, 0, CancelToken::new());
        assert!(past.deadline_reached());
        assert!(past.should_stop());
        let future = WorkerContext::new(0, u64::MAX, CancelToken::new());
        assert!(!future.deadline_reached());
    }
}
