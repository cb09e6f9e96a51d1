//! Thread-safe event hub.
//!
//! [`EventHub`] keeps an insertion-ordered registry of listeners behind a
//! single mutex and fans a payload out to every active listener on
//! [`trigger`](EventHub::trigger). Unsubscription is mark-then-compact:
//! dropping a [`SubscriptionHandle`] tombstones the entry and a later
//! subscribe-or-trigger pass reclaims it, amortizing compaction and never
//! invalidating entries an in-flight trigger already captured.
//!
//! ## Lock discipline
//! ```text
//! subscribe(f)              trigger(&payload)              handle drop
//!     │                          │                              │
//!     ▼                          ▼                              ▼
//! ┌─ lock ──────────┐   ┌─ lock ───────────────┐   ┌─ lock ────────────┐
//! │ compact if      │   │ compact if flagged   │   │ tombstone entry   │
//! │ flagged         │   │ snapshot active Arcs │   │ set cleanup flag  │
//! │ append entry    │   └─ unlock ─────────────┘   └─ unlock ──────────┘
//! └─ unlock ────────┘              │
//!                                  ▼
//!                     invoke snapshot in subscription
//!                     order, lock NOT held
//! ```
//!
//! The lock is never held across listener code, so a listener may reentrantly
//! subscribe, unsubscribe, or trigger on the same hub without deadlocking.
//! Reentrant mutation is defined by snapshot semantics: a listener subscribed
//! during an in-flight trigger does not receive that call, and a listener
//! unsubscribed during an in-flight trigger may be invoked once more if it was
//! already in the snapshot.

use std::sync::Arc;

use parking_lot::Mutex;

use super::entry::CallbackEntry;
use super::handle::SubscriptionHandle;

/// Registry state guarded by the hub mutex.
struct Registry<T> {
    next_id: u64,
    entries: Vec<Arc<CallbackEntry<T>>>,
    needs_cleanup: bool,
}

impl<T> Registry<T> {
    /// Physically removes tombstoned entries. Runs only when an unsubscribe
    /// happened since the last pass, keeping the common path allocation-free.
    fn compact_if_needed(&mut self) {
        if self.needs_cleanup {
            self.entries.retain(|e| e.is_active());
            self.needs_cleanup = false;
        }
    }
}

/// Shared hub internals. Subscription handles keep only a `Weak` to this, so
/// outstanding handles never extend the hub's lifetime.
pub(crate) struct HubInner<T> {
    registry: Mutex<Registry<T>>,
}

impl<T> HubInner<T> {
    /// Tombstones the entry with the given id and flags the registry for
    /// compaction. Unknown or already-tombstoned ids are a no-op.
    pub(crate) fn unsubscribe(&self, id: u64) {
        let mut reg = self.registry.lock();
        let Registry {
            entries,
            needs_cleanup,
            ..
        } = &mut *reg;
        if let Some(entry) = entries.iter().find(|e| e.id() == id) {
            if entry.deactivate() {
                *needs_cleanup = true;
            }
        }
    }
}

/// Thread-safe registry of listeners with synchronous fan-out.
///
/// Cloning shares the same registry; the hub is dropped when the last
/// application-side clone goes away, regardless of outstanding
/// [`SubscriptionHandle`]s.
///
/// # Example
/// ```
/// use fanout::EventHub;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// let hub: EventHub<u32> = EventHub::new();
/// let sum = Arc::new(AtomicU32::new(0));
/// let s = Arc::clone(&sum);
/// let handle = hub.subscribe(move |v| {
///     s.fetch_add(*v, Ordering::Relaxed);
/// });
///
/// hub.trigger(&5);
/// assert_eq!(sum.load(Ordering::Relaxed), 5);
///
/// drop(handle);
/// hub.trigger(&5);
/// assert_eq!(sum.load(Ordering::Relaxed), 5);
/// ```
pub struct EventHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T: 'static> EventHub<T> {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: Mutex::new(Registry {
                    next_id: 0,
                    entries: Vec::new(),
                    needs_cleanup: false,
                }),
            }),
        }
    }

    /// Registers a listener and returns its owning RAII token.
    ///
    /// Listeners are invoked in subscription order. Registration is
    /// allocation-only and infallible; ids are unique and monotonically
    /// increasing for the hub's lifetime.
    #[must_use = "dropping the handle unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionHandle<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut reg = self.inner.registry.lock();
        reg.compact_if_needed();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.entries
            .push(Arc::new(CallbackEntry::new(id, Arc::new(listener))));
        SubscriptionHandle::new(Arc::downgrade(&self.inner), id)
    }

    /// Fans `payload` out to every active listener, in subscription order.
    ///
    /// Takes a snapshot of the active entries under the lock, then invokes
    /// with the lock released, so listeners may reentrantly call back into
    /// the hub (see the module docs for the resulting visibility rules).
    /// A panicking listener is contained and the remaining listeners still
    /// run.
    pub fn trigger(&self, payload: &T) {
        let snapshot: Vec<Arc<CallbackEntry<T>>> = {
            let mut reg = self.inner.registry.lock();
            reg.compact_if_needed();
            reg.entries.iter().filter(|e| e.is_active()).cloned().collect()
        };

        for entry in &snapshot {
            entry.invoke(payload);
        }
    }

    /// Number of active (non-tombstoned) listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .registry
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_active())
            .count()
    }

    /// True if no active listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries, tombstones included.
    #[cfg(test)]
    fn stored(&self) -> usize {
        self.inner.registry.lock().entries.len()
    }
}

impl<T: 'static> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
