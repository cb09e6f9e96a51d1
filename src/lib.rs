//! # fanout
//!
//! **Fanout** is a lightweight in-process publish/subscribe library for Rust.
//!
//! It lets components notify a dynamic set of listeners without coupling
//! producer and consumer lifetimes: consumers subscribe closures and hold an
//! RAII token, producers trigger with a payload, and dropping the token
//! unregisters the listener. A separate dispatcher layers time-deferred
//! delivery on top of the same callback contract.
//!
//! ## Architecture
//! ```text
//!  consumer A        consumer B              producer
//!      │                 │                      │
//!  subscribe(f)      subscribe(g)          trigger(&payload)
//!      │                 │                      │
//!      ▼                 ▼                      ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  EventHub (mutex-guarded registry)                        │
//! │  - CallbackEntry { id, callback, active }  (tombstones)   │
//! │  - lazy compaction on subscribe/trigger                   │
//! │  - snapshot fan-out, lock never held across listeners     │
//! └──────┬────────────────────────────────────────────────────┘
//!        │ returns                       invocation order =
//!        ▼                               subscription order
//!  SubscriptionHandle (weak back-reference; drop unsubscribes)
//!
//! ┌───────────────────────────────────────────────────────────┐
//! │  DelayedDispatcher                                        │
//! │  - immediate list: sync fan-out on the triggering thread  │
//! │  - delayed list: one tracked unit per entry per trigger   │
//! │    (sleep_until deadline → invoke; cancellable, awaitable │
//! │     via shutdown(grace))                                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! | Area            | Description                                              | Key types                 |
//! |-----------------|----------------------------------------------------------|---------------------------|
//! | **Hub**         | Thread-safe registry, synchronous fan-out.               | [`EventHub`]              |
//! | **Handles**     | Lifetime-scoped auto-unsubscription.                     | [`SubscriptionHandle`]    |
//! | **Dispatch**    | Immediate + deferred delivery, managed background units. | [`DelayedDispatcher`]     |
//! | **Errors**      | Typed registration/shutdown failures.                    | [`DispatchError`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fanout::{DelayedDispatcher, EventHub};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Synchronous fan-out with RAII subscriptions.
//!     let hub: EventHub<String> = EventHub::new();
//!     let seen = Arc::new(AtomicUsize::new(0));
//!     let counter = Arc::clone(&seen);
//!     let handle = hub.subscribe(move |msg: &String| {
//!         println!("status update: {msg}");
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     });
//!
//!     hub.trigger(&"link up".to_string());
//!     drop(handle); // listener is unregistered here
//!     hub.trigger(&"link down".to_string());
//!     assert_eq!(seen.load(Ordering::Relaxed), 1);
//!
//!     // Immediate + deferred delivery.
//!     let dispatcher: DelayedDispatcher<u32> = DelayedDispatcher::new();
//!     dispatcher.subscribe(|code: &u32| println!("immediately: {code}"));
//!     dispatcher.subscribe_with_delay(|code: &u32| println!("20ms later: {code}"), 20)?;
//!
//!     dispatcher.trigger(&7);
//!     dispatcher.shutdown(Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```

mod callback;
mod dispatch;
mod error;
mod hub;

// ---- Public re-exports ----

pub use callback::Callback;
pub use dispatch::DelayedDispatcher;
pub use error::DispatchError;
pub use hub::{EventHub, SubscriptionHandle};
