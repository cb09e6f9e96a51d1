//! Leaf data unit of the hub registry.
//!
//! A [`CallbackEntry`] binds a per-hub monotonic id to a listener callback and
//! a liveness flag. Unsubscription tombstones the flag; physical removal is
//! deferred to the next cleanup pass. Entries are shared (`Arc`) between the
//! primary registry list and any in-flight trigger snapshot, so tombstoning
//! never invalidates a snapshot that already captured the entry.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::callback::{invoke_guarded, Callback};

pub(crate) struct CallbackEntry<T> {
    id: u64,
    callback: Callback<T>,
    active: AtomicBool,
}

impl<T> CallbackEntry<T> {
    pub(crate) fn new(id: u64, callback: Callback<T>) -> Self {
        Self {
            id,
            callback,
            active: AtomicBool::new(true),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// True while the subscription has not been tombstoned.
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Tombstones the entry. Returns `true` on the first call, `false` once
    /// already inactive (double unsubscribe is a no-op).
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Invokes the listener under the crate-wide panic guard.
    pub(crate) fn invoke(&self, payload: &T) {
        invoke_guarded("hub", &self.callback, payload);
    }
}
