//! Deferred one-shot actions keyed by identifier.
//!
//! Identifiers encode which logical entities share a single outstanding
//! timer: `mute:<guild>:<user>`, `timeout:<user>`, `lock:<guild>:<channel>`,
//! `announce:<guild>:<channel>:<timestamp>`. Registering under an existing
//! identifier cancels the previous timer first; cancellation is cooperative
//! and cannot interrupt an action that has already started running. Action
//! failures are logged and swallowed here so one failing reversal cannot
//! corrupt the registry or crash unrelated timers.

use crate::error::{CoreError, CoreResult};
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Duration;
use tracing::{debug, warn};

struct TimerEntry {
    // Generation guard: a finished timer only removes the registry entry if
    // it is still its own. Without it, a stale completion could drop a
    // replacement registered under the same identifier.
    seq: u64,
    cancel: oneshot::Sender<()>,
}

/// Registry of pending deferred actions. Cheap to clone; clones share the
/// same registry.
#[derive(Clone, Default)]
pub struct Scheduler {
    timers: Arc<DashMap<String, TimerEntry>>,
    next_seq: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` to run once after `delay`, replacing (and
    /// cancelling) any pending action under the same identifier. The
    /// scheduler does not reinterpret non-positive delays; callers clamp.
    ///
    /// Fails with [`CoreError::SchedulerUnavailable`] when called outside a
    /// tokio runtime, so callers can report that the timed reversal was not
    /// armed instead of claiming success.
    pub fn schedule<F>(
        &self,
        identifier: impl Into<String>,
        delay: Duration,
        action: F,
    ) -> CoreResult<()>
    where
        F: Future<Output = CoreResult<()>> + Send + 'static,
    {
        let identifier = identifier.into();
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            CoreError::SchedulerUnavailable {
                identifier: identifier.clone(),
            }
        })?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        // Cancel-then-insert under the map slot: the previous sender is
        // dropped while the slot is held, so no window exists where the old
        // timer is live but unreachable.
        if let Some(previous) = self.timers.insert(
            identifier.clone(),
            TimerEntry {
                seq,
                cancel: cancel_tx,
            },
        ) {
            drop(previous.cancel);
            debug!(identifier = %identifier, "replaced pending deferred action");
        }

        let timers = Arc::clone(&self.timers);
        handle.spawn(async move {
            let fired = tokio::select! {
                _ = &mut cancel_rx => false,
                _ = tokio::time::sleep(delay) => true,
            };

            if fired {
                // Past this point the action runs to completion; cancel() no
                // longer has any effect on it.
                if let Err(err) = action.await {
                    warn!(identifier = %identifier, error = %err, "deferred action failed");
                }
            }

            timers.remove_if(&identifier, |_, entry| entry.seq == seq);
        });

        Ok(())
    }

    /// Stops and removes a pending action; no-op if the identifier is
    /// unknown or the action already ran.
    pub fn cancel(&self, identifier: &str) {
        if let Some((_, entry)) = self.timers.remove(identifier) {
            drop(entry.cancel);
            debug!(identifier = %identifier, "cancelled deferred action");
        }
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        self.timers.contains_key(identifier)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn bump(counter: &Arc<AtomicUsize>) -> impl Future<Output = CoreResult<()>> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_once_and_frees_the_identifier() {
        let scheduler = Scheduler::new();
        let fired = counter();

        scheduler
            .schedule("x", Duration::from_secs(5), bump(&fired))
            .unwrap();
        assert!(scheduler.is_pending("x"));

        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("x"));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_previous_action() {
        let scheduler = Scheduler::new();
        let first = counter();
        let second = counter();

        scheduler
            .schedule("x", Duration::from_secs(2), bump(&first))
            .unwrap();
        scheduler
            .schedule("x", Duration::from_secs(10), bump(&second))
            .unwrap();

        // Past the first delay: the replaced action must never run
        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending("x"));

        tokio::time::sleep(Duration::from_secs(8)).await;
        tokio::task::yield_now().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("x"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_the_delay_prevents_execution() {
        let scheduler = Scheduler::new();
        let fired = counter();

        scheduler
            .schedule("x", Duration::from_secs(5), bump(&fired))
            .unwrap();
        scheduler.cancel("x");
        assert!(!scheduler.is_pending("x"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_execution_is_a_no_op() {
        let scheduler = Scheduler::new();
        let fired = counter();

        scheduler
            .schedule("x", Duration::from_secs(1), bump(&fired))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        scheduler.cancel("x");
        scheduler.cancel("never-existed");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_run_independently() {
        let scheduler = Scheduler::new();
        let first = counter();
        let second = counter();

        scheduler
            .schedule("a", Duration::from_secs(1), bump(&first))
            .unwrap();
        scheduler
            .schedule("b", Duration::from_secs(5), bump(&second))
            .unwrap();
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending("b"));

        tokio::time::sleep(Duration::from_secs(4)).await;
        tokio::task::yield_now().await;
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failing_action_frees_its_identifier() {
        let scheduler = Scheduler::new();
        let fired = counter();

        scheduler
            .schedule("x", Duration::from_secs(1), async {
                Err(CoreError::SchedulerUnavailable {
                    identifier: "synthetic failure".to_string(),
                })
            })
            .unwrap();
        scheduler
            .schedule("y", Duration::from_secs(2), bump(&fired))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        // The failure was swallowed; the other timer still ran
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending("x"));
        assert!(!scheduler.is_pending("y"));
    }

    #[tokio::test(start_paused = true)]
    async fn a_stale_completion_does_not_remove_a_replacement() {
        let scheduler = Scheduler::new();
        let fired = counter();

        scheduler
            .schedule("x", Duration::from_secs(1), bump(&fired))
            .unwrap();
        // Let the first action fire, then immediately reuse the identifier
        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        scheduler
            .schedule("x", Duration::from_secs(60), bump(&fired))
            .unwrap();
        tokio::task::yield_now().await;
        assert!(scheduler.is_pending("x"));
    }

    #[test]
    fn schedule_outside_a_runtime_reports_unavailable() {
        let scheduler = Scheduler::new();
        let result = scheduler.schedule("x", Duration::from_secs(1), async { Ok(()) });
        assert!(matches!(
            result,
            Err(CoreError::SchedulerUnavailable { identifier }) if identifier == "x"
        ));
    }
}
