//! RAII subscription token.
//!
//! [`SubscriptionHandle`] is returned by [`EventHub::subscribe`](crate::EventHub::subscribe)
//! and owns the right to unregister that listener exactly once. It holds a
//! *non-owning* back-reference to the hub: handles never keep a hub alive, and
//! a handle outliving its hub degrades to a no-op on drop.
//!
//! ## Ownership semantics
//! - Not `Clone`: each registration has exactly one owning token.
//! - Moving the handle never unsubscribes; only destruction of the final owner
//!   does, exactly once.
//! - [`detach`](SubscriptionHandle::detach) gives up the right to unsubscribe,
//!   pinning the listener for the hub's remaining lifetime.

use std::fmt;
use std::sync::Weak;

use super::core::HubInner;

/// Owning token for one hub subscription; unregisters the listener on drop.
pub struct SubscriptionHandle<T> {
    hub: Weak<HubInner<T>>,
    id: u64,
}

impl<T> SubscriptionHandle<T> {
    pub(crate) fn new(hub: Weak<HubInner<T>>, id: u64) -> Self {
        Self { hub, id }
    }

    /// The id assigned to this subscription by its hub.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True while the hub this handle refers to is still alive.
    pub fn is_attached(&self) -> bool {
        self.hub.strong_count() > 0
    }

    /// Unsubscribes now by consuming the handle.
    ///
    /// Sugar over dropping it; calling this on a handle whose hub is already
    /// gone is a no-op.
    pub fn cancel(self) {}

    /// Consumes the handle without ever unsubscribing.
    ///
    /// The listener stays registered for the hub's remaining lifetime.
    pub fn detach(mut self) {
        self.hub = Weak::new();
    }
}

impl<T> Drop for SubscriptionHandle<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}

impl<T> fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::EventHub;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_unsubscribes_now() {
        let hub: EventHub<()> = EventHub::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handle = hub.subscribe(move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });
        handle.cancel();
        hub.trigger(&());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_detach_pins_listener() {
        let hub: EventHub<()> = EventHub::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        hub.subscribe(move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        })
        .detach();
        hub.trigger(&());
        hub.trigger(&());
        assert_eq!(hits.load(Ordering::Relaxed), 2);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_is_attached_tracks_hub_lifetime() {
        let hub: EventHub<u8> = EventHub::new();
        let handle = hub.subscribe(|_| {});
        assert!(handle.is_attached());
        drop(hub);
        assert!(!handle.is_attached());
        // Drop of a detached-from-reality handle is a no-op.
        drop(handle);
    }
}
