use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::Response;
use http_body_util::Full;
use pin_project::pin_project;

/// Response future of the optimize service.
#[pin_project]
pub struct ResponseFuture<E> {
    #[pin]
    inner: BoxFuture<'static, Result<Response<Full<Bytes>>, E>>,
}

impl<E> ResponseFuture<E> {
    pub(crate) fn new(inner: BoxFuture<'static, Result<Response<Full<Bytes>>, E>>) -> Self {
        Self { inner }
    }
}

impl<E> Future for ResponseFuture<E> {
    type Output = Result<Response<Full<Bytes>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().inner.poll(cx)
    }
}
