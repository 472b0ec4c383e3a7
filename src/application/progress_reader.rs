//! Byte-counting decorator for a response body stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{ready, Stream};

/// Called with the cumulative number of bytes read so far.
pub type ProgressFn = Box<dyn FnMut(u64) + Send>;

/// Forwards every chunk of the wrapped stream unchanged and reports the running byte count.
///
/// Knows nothing about HTTP, files or cancellation. A `None` callback makes it a plain counter.
pub struct ProgressReader<S> {
    inner: S,
    bytes_read: u64,
    on_progress: Option<ProgressFn>,
}

impl<S> ProgressReader<S> {
    pub fn new(inner: S, on_progress: Option<ProgressFn>) -> Self {
        Self {
            inner,
            bytes_read: 0,
            on_progress,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<S, B, E> Stream for ProgressReader<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<B, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));

        if let Some(Ok(chunk)) = &item {
            this.bytes_read += chunk.as_ref().len() as u64;
            if let Some(callback) = this.on_progress.as_mut() {
                callback(this.bytes_read);
            }
        }

        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
