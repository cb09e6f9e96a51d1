//! Error types used by the dispatch layer.
//!
//! The hub itself has no failure modes: registration is allocation-only and
//! unsubscription of an unknown or already-removed id is an idempotent no-op.
//! [`DispatchError`] covers the two outcomes that are real errors:
//!
//! - a negative delay passed to [`DelayedDispatcher::subscribe_with_delay`](crate::DelayedDispatcher::subscribe_with_delay),
//!   rejected at registration time;
//! - a shutdown that exceeded its grace period while delayed invocations were
//!   still outstanding.
//!
//! The type provides helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the delayed dispatch layer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A deferred registration requested a negative delay.
    ///
    /// Rejected before anything is stored; a negative delay never degrades
    /// into an immediate, unflagged invocation.
    #[error("negative delay requested: {delay_ms}ms")]
    NegativeDelay {
        /// The requested delay in milliseconds.
        delay_ms: i64,
    },

    /// Shutdown grace period was exceeded; outstanding delayed invocations
    /// were cancelled instead of awaited.
    #[error("shutdown grace {grace:?} exceeded; {outstanding} delayed invocation(s) abandoned")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of delayed invocations still outstanding when the grace
        /// window closed.
        outstanding: usize,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanout::DispatchError;
    ///
    /// let err = DispatchError::NegativeDelay { delay_ms: -250 };
    /// assert_eq!(err.as_label(), "negative_delay");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NegativeDelay { .. } => "negative_delay",
            DispatchError::GraceExceeded { .. } => "dispatch_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::NegativeDelay { delay_ms } => {
                format!("negative delay: {delay_ms}ms")
            }
            DispatchError::GraceExceeded { grace, outstanding } => {
                format!("grace exceeded after {grace:?}; abandoned={outstanding}")
            }
        }
    }
}
