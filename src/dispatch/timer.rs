//! Deadline-based waiting for delayed dispatch.
//!
//! Each delayed invocation waits on an *absolute* deadline: a wait that is
//! interrupted and resumed can never return early, because the remaining
//! duration is derived from the deadline rather than re-counted. The wait
//! races against the dispatcher's [`CancellationToken`] so shutdown can
//! abandon outstanding units deterministically.

use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::callback::{panic_message, Callback};
use crate::error::DispatchError;

/// Validates a requested delay given in milliseconds.
///
/// A negative delay is a usage error surfaced at registration time; it never
/// degrades into an immediate invocation.
pub(crate) fn delay_from_millis(delay_ms: i64) -> Result<Duration, DispatchError> {
    if delay_ms < 0 {
        return Err(DispatchError::NegativeDelay { delay_ms });
    }
    Ok(Duration::from_millis(delay_ms as u64))
}

/// One delayed execution unit: wait until `deadline`, then invoke `callback`
/// with the payload captured at trigger time.
///
/// Returns without invoking when `cancel` fires first. The invocation runs
/// under the same catch-and-continue policy as the synchronous fan-out paths.
pub(crate) async fn fire_at<T>(
    deadline: Instant,
    cancel: CancellationToken,
    callback: Callback<T>,
    payload: T,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!("delayed invocation abandoned by shutdown");
        }
        _ = tokio::time::sleep_until(deadline) => {
            let fut = async { callback(&payload) };
            if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                tracing::warn!(
                    origin = "dispatch",
                    panic = panic_message(panic.as_ref()),
                    "delayed listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_delay_is_rejected() {
        let err = delay_from_millis(-1).unwrap_err();
        assert!(matches!(err, DispatchError::NegativeDelay { delay_ms: -1 }));
    }

    #[test]
    fn test_zero_and_positive_delays_pass() {
        assert_eq!(delay_from_millis(0).unwrap(), Duration::ZERO);
        assert_eq!(delay_from_millis(250).unwrap(), Duration::from_millis(250));
    }
}
