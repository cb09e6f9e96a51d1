//! Shared callback plumbing.
//!
//! [`Callback`] is the invocable unit stored by both the hub and the delayed
//! dispatcher: a shared, thread-safe closure taking the trigger payload by
//! reference. Synchronous fan-out paths invoke through [`invoke_guarded`],
//! which pins the crate-wide invocation-failure policy: **catch and continue**.
//! A panicking listener is reported through `tracing` and never aborts the
//! remaining fan-out, and it cannot corrupt registry state because no lock is
//! held across user code.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Shared listener callback.
///
/// Stored behind `Arc` so a registry entry and an in-flight trigger snapshot
/// can own the same callback simultaneously.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Invokes `cb` with `payload`, containing any panic it raises.
///
/// `origin` names the fan-out path for diagnostics (`"hub"`, `"dispatch"`).
pub(crate) fn invoke_guarded<T>(origin: &'static str, cb: &Callback<T>, payload: &T) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| cb(payload))) {
        tracing::warn!(
            origin,
            panic = panic_message(panic.as_ref()),
            "listener panicked during fan-out"
        );
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
