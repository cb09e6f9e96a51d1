//! Delayed dispatch: immediate and time-deferred fan-out.
//!
//! This module groups the [`DelayedDispatcher`] and its timing plumbing:
//! - `delayed` the dispatcher itself (two append-only listener lists)
//! - `timer` delay validation and the cancellable deadline wait
//!
//! Delayed invocations run as tracked background units on the tokio runtime;
//! [`DelayedDispatcher::shutdown`] deterministically awaits or abandons them.

mod delayed;
mod timer;

pub use delayed::DelayedDispatcher;
