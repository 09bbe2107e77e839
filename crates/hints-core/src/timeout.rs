//! Bounding the refresh call by its timeout.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::future::{select, Either};

use crate::error::FetchError;

/// Future that completes once its deadline has passed.
///
/// Self-waking: every pending poll re-schedules itself, so it needs no timer
/// facility from the executor. The single-threaded executor keeps polling
/// the raced call future in between.
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }
}

impl Future for Deadline {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if Instant::now() >= self.at {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Run `fut` to completion unless `timeout` passes first.
///
/// On timeout the future is dropped (cancelled) and the caller gets
/// `FetchError::Timeout` carrying the bound that was exceeded.
pub async fn bounded<F, T>(fut: F, timeout: Duration) -> Result<T, FetchError>
where
    F: Future<Output = T>,
{
    futures::pin_mut!(fut);
    match select(fut, Deadline::after(timeout)).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => Err(FetchError::Timeout(timeout)),
    }
}
