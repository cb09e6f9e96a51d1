//! Delayed dispatcher: immediate plus deferred fan-out.
//!
//! [`DelayedDispatcher`] layers two independent, append-only listener lists:
//! immediate-mode subscribers fire synchronously on the triggering thread,
//! delayed-mode subscribers each get one tracked background unit per trigger
//! that waits out its registered delay and then fires once. Neither list
//! supports unsubscription; this mechanism favors fire-once deferred
//! notification over dynamic listener management.
//!
//! ## Trigger path
//! ```text
//! trigger(&payload)
//!   ├─ immediate list ─ snapshot ──► invoke in subscription order (sync)
//!   └─ delayed list ── snapshot ──► one tracked unit per entry
//!                                     └─ sleep_until(deadline) ─► invoke(payload.clone())
//! ```
//!
//! Delayed units are fire-and-forget from the caller's point of view: they
//! are not joined by `trigger` and their outcome is not observable there.
//! They are still managed: every unit runs under a [`TaskTracker`], and
//! [`shutdown`](DelayedDispatcher::shutdown) can deterministically await or
//! abandon whatever is still outstanding. There is no bound on concurrently
//! outstanding units; every trigger spawns one per delayed subscriber.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::timer::{delay_from_millis, fire_at};
use crate::callback::{invoke_guarded, Callback};
use crate::error::DispatchError;

/// One-shot deferred registration: a callback plus its registered delay.
/// No identity and no cancellation; it fires once per trigger call.
struct TimedCallback<T> {
    callback: Callback<T>,
    delay: Duration,
}

/// Fan-out with immediate and time-deferred listener lists.
///
/// `trigger` must be called from within a tokio runtime, since delayed units
/// are spawned onto it. Dropping the dispatcher without calling
/// [`shutdown`](DelayedDispatcher::shutdown) leaves outstanding units running
/// to completion.
///
/// # Example
/// ```
/// use fanout::DelayedDispatcher;
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), fanout::DispatchError> {
///     let dispatcher: DelayedDispatcher<String> = DelayedDispatcher::new();
///     dispatcher.subscribe(|msg: &String| println!("now: {msg}"));
///     dispatcher.subscribe_with_delay(|msg: &String| println!("later: {msg}"), 20)?;
///
///     dispatcher.trigger(&"device ready".to_string());
///     // Waits for the 20ms unit before returning.
///     dispatcher.shutdown(Duration::from_secs(1)).await
/// }
/// ```
pub struct DelayedDispatcher<T> {
    immediate: Mutex<Vec<Callback<T>>>,
    delayed: Mutex<Vec<TimedCallback<T>>>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl<T: Clone + Send + 'static> DelayedDispatcher<T> {
    /// Creates a dispatcher with no listeners.
    pub fn new() -> Self {
        Self {
            immediate: Mutex::new(Vec::new()),
            delayed: Mutex::new(Vec::new()),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Immediate-mode registration. Append-only; there is no unsubscribe.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.immediate.lock().push(Arc::new(listener));
    }

    /// One-shot deferred registration: fires once per trigger call,
    /// `delay_ms` milliseconds after it, with the trigger's payload.
    ///
    /// # Errors
    /// [`DispatchError::NegativeDelay`] if `delay_ms` is negative; nothing is
    /// registered in that case.
    pub fn subscribe_with_delay<F>(&self, listener: F, delay_ms: i64) -> Result<(), DispatchError>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let delay = delay_from_millis(delay_ms)?;
        self.delayed.lock().push(TimedCallback {
            callback: Arc::new(listener),
            delay,
        });
        Ok(())
    }

    /// Fans `payload` out: immediate listeners synchronously in subscription
    /// order, then one tracked background unit per delayed listener.
    ///
    /// Each list is snapshotted under its own lock and invoked with the lock
    /// released. Delayed units race independently against each other and
    /// against the calling thread; their success or failure is not
    /// observable here.
    pub fn trigger(&self, payload: &T) {
        let immediate: Vec<Callback<T>> = self.immediate.lock().clone();
        for cb in &immediate {
            invoke_guarded("dispatch", cb, payload);
        }

        let delayed: Vec<(Callback<T>, Duration)> = self
            .delayed
            .lock()
            .iter()
            .map(|t| (Arc::clone(&t.callback), t.delay))
            .collect();

        let now = Instant::now();
        for (callback, delay) in delayed {
            let _ = self.tracker.spawn(fire_at(
                now + delay,
                self.cancel.clone(),
                callback,
                payload.clone(),
            ));
        }
    }

    /// Number of immediate-mode listeners.
    #[must_use]
    pub fn immediate_count(&self) -> usize {
        self.immediate.lock().len()
    }

    /// Number of delayed-mode listeners.
    #[must_use]
    pub fn delayed_count(&self) -> usize {
        self.delayed.lock().len()
    }

    /// Number of delayed invocations currently outstanding.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Graceful shutdown: waits up to `grace` for outstanding delayed units.
    ///
    /// On timeout the remaining units are cancelled (their callbacks never
    /// fire) and [`DispatchError::GraceExceeded`] reports how many were
    /// abandoned.
    pub async fn shutdown(self, grace: Duration) -> Result<(), DispatchError> {
        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                let outstanding = self.tracker.len();
                self.cancel.cancel();
                Err(DispatchError::GraceExceeded { grace, outstanding })
            }
        }
    }
}

impl<T: Clone + Send + 'static> Default for DelayedDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move |_: &u32| {
            h.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_listeners_fire_in_order_synchronously() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let log: Arc<Mutex<Vec<(&'static str, u32)>>> = Arc::new(Mutex::new(Vec::new()));

        let mk = |name: &'static str| {
            let log = Arc::clone(&log);
            move |v: &u32| log.lock().push((name, *v))
        };
        dispatcher.subscribe(mk("a"));
        dispatcher.subscribe(mk("b"));
        dispatcher.subscribe(mk("c"));

        dispatcher.trigger(&5);
        // No await between trigger and assert: delivery was synchronous.
        assert_eq!(*log.lock(), vec![("a", 5), ("b", 5), ("c", 5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_fires_once_after_delay_not_synchronously() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe_with_delay(cb, 100).unwrap();

        dispatcher.trigger(&7);
        assert_eq!(hits.load(Ordering::Relaxed), 0, "never synchronous");

        advance(Duration::from_millis(99)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 0, "not before the deadline");

        advance(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 1, "fires after the delay");

        advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 1, "fires exactly once per trigger");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delayed_fires_in_background_wall_clock() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe_with_delay(cb, 50).unwrap();

        dispatcher.trigger(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 0);

        // Generous tolerance: poll up to 2s for the single firing.
        for _ in 0..200 {
            if hits.load(Ordering::Relaxed) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_trigger_fires_each_delayed_listener_once() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe_with_delay(cb, 10).unwrap();

        dispatcher.trigger(&1);
        dispatcher.trigger(&2);
        assert_eq!(dispatcher.outstanding(), 2);

        advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_delay_never_registers_or_fires() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();

        let err = dispatcher.subscribe_with_delay(cb, -5).unwrap_err();
        assert!(matches!(err, DispatchError::NegativeDelay { delay_ms: -5 }));
        assert_eq!(dispatcher.delayed_count(), 0);

        dispatcher.trigger(&0);
        advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_outstanding_units() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe_with_delay(cb, 100).unwrap();

        dispatcher.trigger(&0);
        dispatcher
            .shutdown(Duration::from_secs(1))
            .await
            .expect("unit finishes inside grace");
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_units_past_grace() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe_with_delay(cb, 10_000).unwrap();

        dispatcher.trigger(&0);
        let err = dispatcher
            .shutdown(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::GraceExceeded { outstanding: 1, .. }
        ));

        // The abandoned unit must never fire, even past its deadline.
        advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_immediate_listener_does_not_abort_fanout() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        let (hits, cb) = counter();
        dispatcher.subscribe(|_: &u32| panic!("listener bug"));
        dispatcher.subscribe(cb);

        dispatcher.trigger(&0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(dispatcher.immediate_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts() {
        let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
        dispatcher.subscribe(|_| {});
        dispatcher.subscribe(|_| {});
        dispatcher.subscribe_with_delay(|_| {}, 5).unwrap();

        assert_eq!(dispatcher.immediate_count(), 2);
        assert_eq!(dispatcher.delayed_count(), 1);
        assert_eq!(dispatcher.outstanding(), 0);
    }
}
