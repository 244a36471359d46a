//! Small [`tower`] helpers shared by the periscope crates

use std::pin::Pin;

use futures::Future;

#[cfg(any(test, feature = "test"))]
pub mod test;

/// Boxed, sendable future returned by the periscope services
pub type ResponseFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Takes the service that was just driven to readiness out of `src`, leaving a fresh clone behind.
///
/// `tower` only guarantees readiness for the instance `poll_ready` was called on, so the
/// ready instance is the one that must be moved into the response future.
pub fn take_ready<S, T>(src: &mut S) -> S
where
    S: tower::Service<T> + Clone,
{
    let clone = src.clone();
    std::mem::replace(src, clone)
}
