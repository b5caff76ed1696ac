//! Cancellable one-shot and repeating timers.
//!
//! Each timer is a tokio task gated by a [`CancellationToken`]. The
//! returned [`CancelHandle`] is the only way to stop it; dropping the
//! handle does not cancel the timer.
//!
//! [`TimerSlot`] holds at most one live timer and makes
//! cancel-and-replace a single step, so a superseded timer can never keep
//! firing alongside its replacement.

use std::ops::ControlFlow;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Handle to a scheduled timer.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Stop the timer. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Run `callback` once after `delay`, unless cancelled first.
///
/// Must be called from within a tokio runtime.
pub fn schedule<F>(delay: Duration, callback: F) -> CancelHandle
where
    F: FnOnce() + Send + 'static,
{
    let handle = CancelHandle::new();
    let token = handle.token.clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                if !token.is_cancelled() {
                    callback();
                }
            }
        }
    });

    handle
}

/// Run `callback` immediately and then every `period` until it returns
/// [`ControlFlow::Break`] or the handle is cancelled.
///
/// Must be called from within a tokio runtime. The spawned task panics if
/// `period` is zero.
pub fn schedule_repeating<F>(period: Duration, mut callback: F) -> CancelHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let handle = CancelHandle::new();
    let token = handle.token.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if token.is_cancelled() || callback().is_break() {
                        break;
                    }
                }
            }
        }
    });

    handle
}

// ---------------------------------------------------------------------------
// TimerSlot
// ---------------------------------------------------------------------------

/// Holder for at most one active timer.
#[derive(Debug, Default)]
pub struct TimerSlot {
    current: Mutex<Option<CancelHandle>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancelHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the current timer (if any), then start a new one with `start`.
    ///
    /// Both steps happen under the slot lock.
    pub fn replace_with<F>(&self, start: F)
    where
        F: FnOnce() -> CancelHandle,
    {
        let mut current = self.lock();
        if let Some(old) = current.take() {
            old.cancel();
        }
        *current = Some(start());
    }

    /// Install an already-scheduled timer, cancelling the previous one.
    pub fn replace(&self, handle: CancelHandle) {
        if let Some(old) = self.lock().replace(handle) {
            old.cancel();
        }
    }

    /// Cancel and clear the current timer. Returns whether one was present.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(old) => {
                old.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether the slot holds a timer that has not been cancelled.
    ///
    /// A one-shot timer that already fired still counts as armed until the
    /// slot is cleared or replaced.
    pub fn is_armed(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_after_delay() {
        let fired = counter();
        let f = fired.clone();
        let _handle = schedule(Duration::from_millis(400), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_one_shot_never_fires() {
        let fired = counter();
        let f = fired.clone();
        let handle = schedule(Duration::from_millis(100), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        handle.cancel();
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(handle.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_fires_immediately_then_per_period() {
        let fired = counter();
        let f = fired.clone();
        let handle = schedule_repeating(Duration::from_millis(100), move || {
            f.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        // Ticks at 0, 100, 200 ms.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_stops_on_break() {
        let fired = counter();
        let f = fired.clone();
        let _handle = schedule_repeating(Duration::from_millis(100), move || {
            if f.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(1_050)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_replacement_leaves_one_timer_running() {
        let first = counter();
        let second = counter();
        let slot = TimerSlot::new();

        let f = first.clone();
        slot.replace_with(|| {
            schedule_repeating(Duration::from_millis(100), move || {
                f.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            })
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(first.load(Ordering::SeqCst), 2);

        let s = second.clone();
        slot.replace_with(|| {
            schedule_repeating(Duration::from_millis(100), move || {
                s.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            })
        });
        // Second timer ticks at 150, 250, 350 ms; first must stay frozen.
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 3);
        assert!(slot.is_armed());

        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert!(!slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn replace_cancels_previous_handle() {
        let slot = TimerSlot::new();
        let first = schedule(Duration::from_secs(10), || {});
        slot.replace(first.clone());

        slot.replace(schedule(Duration::from_secs(10), || {}));

        assert!(first.is_cancelled());
        assert!(slot.is_armed());
    }
}
