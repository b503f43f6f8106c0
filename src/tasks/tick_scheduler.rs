//! Cancellable delayed and repeating background activities

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    task::AbortHandle,
    time::{interval_at, sleep_until, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Handle to a scheduled activity.
///
/// Cancelling is idempotent and also valid after the activity completed on
/// its own. An invocation that already passed its cancellation check runs to
/// completion; callers that need a hard fence must serialise with the
/// callback themselves.
#[derive(Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    task: AbortHandle,
}

impl TaskHandle {
    /// Stop all future invocations tied to this handle
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("Cancelling scheduled task");
        }
        self.task.abort();
    }

    /// Whether `cancel` has been called on this handle
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the underlying task has stopped running
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs callbacks on the tokio runtime, independently of the caller
#[derive(Debug, Clone)]
pub struct TickScheduler {
    runtime: Handle,
}

impl TickScheduler {
    /// Create a scheduler that spawns onto the given runtime
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Create a scheduler bound to the current runtime.
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Invoke `callback` once after `delay` unless cancelled first
    pub fn schedule_once<F>(&self, delay: Duration, callback: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        // Deadline is taken now, not when the task is first polled
        let deadline = Instant::now() + delay;

        let join = self.runtime.spawn(async move {
            sleep_until(deadline).await;
            if !flag.load(Ordering::Acquire) {
                callback();
            }
        });

        TaskHandle {
            cancelled,
            task: join.abort_handle(),
        }
    }

    /// Invoke `callback` every `period` until cancelled.
    ///
    /// The first invocation happens one full period after scheduling.
    pub fn schedule_repeating<F>(&self, period: Duration, callback: F) -> TaskHandle
    where
        F: Fn() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let first = Instant::now() + period;

        let join = self.runtime.spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                callback();
            }
        });

        TaskHandle {
            cancelled,
            task: join.abort_handle(),
        }
    }

    /// Cancel a previously scheduled activity
    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (Arc::clone(&count), count)
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_after_delay() {
        let scheduler = TickScheduler::current();
        let (count, seen) = counter();

        let handle = scheduler.schedule_once(Duration::from_millis(2000), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(1950)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_once_never_fires() {
        let scheduler = TickScheduler::current();
        let (count, seen) = counter();

        let handle = scheduler.schedule_once(Duration::from_millis(500), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(250)).await;
        scheduler.cancel(&handle);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_waits_one_period_before_first_call() {
        let scheduler = TickScheduler::current();
        let (count, seen) = counter();

        let handle = scheduler.schedule_repeating(Duration::from_millis(100), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 4);

        handle.cancel();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_safe_after_completion() {
        let scheduler = TickScheduler::current();

        let handle = scheduler.schedule_once(Duration::from_millis(10), || {});
        sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());

        scheduler.cancel(&handle);
        scheduler.cancel(&handle);
        assert!(handle.is_cancelled());
    }
}
