//! Echo guard.
//!
//! While a task applies a message received from the peer, the local
//! mutations it makes must not be recorded as new outbound changes, or the
//! change would bounce back to its origin. The guard is a task-local flag:
//! [`guarded`] sets it for the duration of one future, and the store's
//! change hook consults [`is_active`] before recording an event.
//!
//! The flag lives in the future's own task-local slot, so it is gone once
//! the future completes, returns an error, panics or is dropped. Tasks
//! spawned from inside a guarded future start with the flag unset.

use std::future::Future;

tokio::task_local! {
    static APPLYING_INBOUND: bool;
}

/// Returns true if the current task is applying an inbound message.
pub fn is_active() -> bool {
    APPLYING_INBOUND.try_with(|active| *active).unwrap_or(false)
}

/// Runs `future` with the guard set.
pub async fn guarded<F>(future: F) -> F::Output
where
    F: Future,
{
    APPLYING_INBOUND.scope(true, future).await
}

/// Runs a synchronous closure with the guard set.
pub fn sync_guarded<R>(f: impl FnOnce() -> R) -> R {
    APPLYING_INBOUND.sync_scope(true, f)
}
