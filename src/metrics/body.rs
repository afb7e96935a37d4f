//! Response body wrapper that counts the bytes sent to the client.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};

type OnComplete = Box<dyn FnOnce(u64) + Send>;

/// Wraps a response body, passing every frame through untouched while
/// counting data bytes. The completion callback runs exactly once with the
/// total: when the stream ends, or when the body is dropped early (client
/// went away, response never polled).
pub struct CountingBody {
    inner: Body,
    bytes: u64,
    on_complete: Option<OnComplete>,
}

impl CountingBody {
    pub fn new(inner: Body, on_complete: impl FnOnce(u64) + Send + 'static) -> Self {
        CountingBody {
            inner,
            bytes: 0,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(self.bytes);
        }
    }
}

impl HttpBody for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
            }
            Poll::Ready(None) => this.complete(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.complete();
    }
}
