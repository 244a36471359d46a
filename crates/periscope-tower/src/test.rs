//! Mocking support for crates that consume periscope services

pub use mockall as mockall_;
pub use pastey as paste_;

/// Declares a `mockall` mock named `Mock<name>Service` implementing
/// `tower::Service<request>` with ready futures.
#[macro_export]
macro_rules! mock_service {
    ($name:ident, $request:ty, $response:ty, $error:ty) => {
        $crate::test::paste_::paste! {
            $crate::test::mockall_::mock! {
                #[allow(dead_code)]
                #[derive(Debug)]
                pub [<$name Service>] {}
                #[allow(dead_code)]
                impl tower::Service<$request> for [<$name Service>] {
                    type Response = $response;
                    type Error = $error;
                    type Future = futures::future::Ready<Result<$response, $error>>;
                    #[allow(clippy::needless_lifetimes)]
                    fn poll_ready<'a>(
                        &mut self,
                        _cx: &mut std::task::Context<'a>,
                    ) -> std::task::Poll<Result<(), $error>>;

                    fn call(&mut self, req: $request) -> futures::future::Ready<Result<$response, $error>>;
                }
            }
        }
    };
}

/// Expects `poll_ready` on a mock service, once or `$times` times.
#[macro_export]
macro_rules! expect_poll_ready {
    ($name:expr, $times:expr) => {
        $name
            .expect_poll_ready()
            .times($times)
            .returning(|_| std::task::Poll::Ready(Ok(())));
    };
    ($name:expr) => {
        $crate::expect_poll_ready!($name, 1)
    };
}

pub use expect_poll_ready;
pub use mock_service;

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use futures::lock::Mutex;
use tower::Service;

use crate::ResponseFuture;

/// Makes a non-`Clone` mock usable where a cloneable service is required,
/// e.g. behind a `BoxCloneService`. Every clone drives the same mock.
pub struct SharedMock<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedMock<S> {
    fn clone(&self) -> Self {
        SharedMock {
            inner: self.inner.clone(),
        }
    }
}

impl<S> SharedMock<S> {
    /// Wraps `inner` for shared use
    pub fn new(inner: S) -> SharedMock<S> {
        SharedMock {
            inner: Arc::new(Mutex::new(inner)),
        }
    }
}

impl<Req, S> Service<Req> for SharedMock<S>
where
    S: Service<Req> + Send + 'static,
    Req: Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.try_lock() {
            Some(mut inner) => inner.poll_ready(cx),
            None => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().await;
            inner.call(req).await
        })
    }
}
