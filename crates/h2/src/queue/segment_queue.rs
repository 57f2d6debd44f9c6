use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::Stream;
use tokio::sync::Notify;
use tracing::{trace, warn};

use crate::buffer::Segment;
use crate::protocol::{AppendError, PayloadItem, QueueError, StreamId};
use crate::queue::DeliveryQueue;

/// An in-memory [`DeliveryQueue`] holding one FIFO per stream id.
///
/// Producers append from the connection's processing context while consumers on other
/// tasks take items for the stream they serve, either polling with
/// [`try_pop`](Self::try_pop) or waiting with [`pop`](Self::pop). Segments are frozen
/// into [`Bytes`] on append.
///
/// Once the end-of-stream marker of a stream id is queued, further appends for that id
/// are rejected. Taking the marker drops the stream's bookkeeping. A consumer that gives
/// up on a stream before its marker calls [`release`](Self::release) instead.
#[derive(Debug, Default)]
pub struct SegmentQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<StreamId, StreamItems>,
    len: usize,
    closed: bool,
}

#[derive(Debug, Default)]
struct StreamItems {
    items: VecDeque<PayloadItem>,
    ended: bool,
}

impl Inner {
    fn pop(&mut self, stream_id: StreamId) -> Option<PayloadItem> {
        let item = self.streams.get_mut(&stream_id)?.items.pop_front()?;
        self.len -= 1;
        if matches!(item, PayloadItem::Eof) {
            self.streams.remove(&stream_id);
            trace!(stream_id, "stream drained");
        }
        Some(item)
    }
}

impl SegmentQueue {
    pub fn new() -> Self {
        Default::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the oldest item of `stream_id` without waiting.
    pub fn try_pop(&self, stream_id: StreamId) -> Option<PayloadItem> {
        self.lock().pop(stream_id)
    }

    /// Waits for the next item of `stream_id`.
    ///
    /// Returns `None` once the queue is closed and nothing is left for the stream.
    pub async fn pop(&self, stream_id: StreamId) -> Option<PayloadItem> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // registered before the check, so an append racing with it still wakes us
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(item) = inner.pop(stream_id) {
                    return Some(item);
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Yields the chunks of `stream_id` until its end-of-stream marker.
    ///
    /// The stream also ends when the queue is closed, so a consumer that must know
    /// whether the marker arrived uses [`pop`](Self::pop) instead.
    pub fn chunks(&self, stream_id: StreamId) -> impl Stream<Item = Bytes> + '_ {
        futures::stream::unfold((), move |()| async move {
            match self.pop(stream_id).await? {
                PayloadItem::Chunk(bytes) => Some((bytes, ())),
                PayloadItem::Eof => None,
            }
        })
    }

    /// Returns true if the end-of-stream marker of `stream_id` is queued and not yet taken.
    pub fn has_eos(&self, stream_id: StreamId) -> bool {
        self.lock().streams.get(&stream_id).is_some_and(|stream| stream.ended)
    }

    /// Number of items waiting for `stream_id`
    pub fn pending(&self, stream_id: StreamId) -> usize {
        self.lock().streams.get(&stream_id).map_or(0, |stream| stream.items.len())
    }

    /// Number of items waiting across all streams
    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything kept for `stream_id` and returns how many items were discarded.
    pub fn release(&self, stream_id: StreamId) -> usize {
        let mut inner = self.lock();
        let discarded = inner.streams.remove(&stream_id).map_or(0, |stream| stream.items.len());
        inner.len -= discarded;
        if discarded > 0 {
            warn!(stream_id, discarded, "released stream with undelivered items");
        }
        discarded
    }

    /// Rejects all further appends and wakes every waiting consumer.
    ///
    /// Items already queued can still be taken.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl DeliveryQueue for SegmentQueue {
    fn append(&self, segment: Segment, stream_id: StreamId) -> Result<(), AppendError> {
        let mut inner = self.lock();
        if inner.closed {
            warn!(stream_id, "delivery queue closed, segment rejected");
            return Err(AppendError::new(segment, QueueError::Closed));
        }

        let stream = inner.streams.entry(stream_id).or_default();
        if stream.ended {
            warn!(stream_id, "segment after end of stream rejected");
            return Err(AppendError::new(segment, QueueError::StreamEnded { stream_id }));
        }

        trace!(stream_id, len = segment.len(), "segment queued");
        stream.items.push_back(PayloadItem::Chunk(segment.freeze()));
        inner.len += 1;
        drop(inner);

        self.notify.notify_waiters();
        Ok(())
    }

    fn append_eos(&self, stream_id: StreamId) -> Result<(), QueueError> {
        let mut inner = self.lock();
        if inner.closed {
            warn!(stream_id, "delivery queue closed, end of stream rejected");
            return Err(QueueError::Closed);
        }

        let stream = inner.streams.entry(stream_id).or_default();
        if stream.ended {
            return Err(QueueError::StreamEnded { stream_id });
        }

        trace!(stream_id, "end of stream queued");
        stream.ended = true;
        stream.items.push_back(PayloadItem::Eof);
        inner.len += 1;
        drop(inner);

        self.notify.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;

    fn segment(data: &[u8]) -> Segment {
        let mut segment = Segment::with_capacity(64).unwrap();
        segment.append(data);
        segment
    }

    fn chunk(data: &'static [u8]) -> PayloadItem {
        PayloadItem::Chunk(Bytes::from_static(data))
    }

    #[test]
    fn keeps_order_per_stream() {
        let queue = SegmentQueue::new();

        queue.append(segment(b"a1"), 1).unwrap();
        queue.append(segment(b"b1"), 3).unwrap();
        queue.append(segment(b"a2"), 1).unwrap();
        queue.append_eos(1).unwrap();
        queue.append(segment(b"b2"), 3).unwrap();

        assert_eq!(queue.len(), 5);
        assert_eq!(queue.pending(1), 3);

        assert_eq!(queue.try_pop(3), Some(chunk(b"b1")));
        assert_eq!(queue.try_pop(1), Some(chunk(b"a1")));
        assert_eq!(queue.try_pop(1), Some(chunk(b"a2")));
        assert_eq!(queue.try_pop(1), Some(PayloadItem::Eof));
        assert_eq!(queue.try_pop(1), None);
        assert_eq!(queue.try_pop(3), Some(chunk(b"b2")));
        assert!(queue.is_empty());
    }

    #[test]
    fn nothing_follows_end_of_stream() {
        let queue = SegmentQueue::new();
        queue.append_eos(5).unwrap();
        assert!(queue.has_eos(5));

        let err = queue.append(segment(b"late"), 5).unwrap_err();
        let (returned, source) = err.into_parts();
        assert_eq!(source, QueueError::StreamEnded { stream_id: 5 });
        assert_eq!(returned.as_bytes(), b"late");

        assert_eq!(queue.append_eos(5), Err(QueueError::StreamEnded { stream_id: 5 }));
        assert_eq!(queue.pending(5), 1);
    }

    #[test]
    fn closed_queue_rejects_appends_but_drains() {
        let queue = SegmentQueue::new();
        queue.append(segment(b"kept"), 1).unwrap();
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.append(segment(b"x"), 1).unwrap_err().error(), &QueueError::Closed);
        assert_eq!(queue.append_eos(1), Err(QueueError::Closed));
        assert_eq!(queue.try_pop(1), Some(chunk(b"kept")));
    }

    #[test]
    fn release_discards_pending_items() {
        let queue = SegmentQueue::new();
        queue.append(segment(b"one"), 7).unwrap();
        queue.append(segment(b"two"), 7).unwrap();
        queue.append(segment(b"other"), 9).unwrap();

        assert_eq!(queue.release(7), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.release(7), 0);
        assert!(!queue.has_eos(7));
    }

    #[tokio::test]
    async fn pop_waits_for_append() {
        let queue = Arc::new(SegmentQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop(1).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.append(segment(b"late"), 1).unwrap();

        assert_eq!(consumer.await.unwrap(), Some(chunk(b"late")));
    }

    #[tokio::test]
    async fn close_wakes_waiting_consumer() {
        let queue = Arc::new(SegmentQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop(1).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close();

        assert_eq!(consumer.await.unwrap(), None);
    }

    #[tokio::test]
    async fn chunks_end_at_end_of_stream() {
        let queue = SegmentQueue::new();
        queue.append(segment(b"hello "), 1).unwrap();
        queue.append(segment(b"world"), 1).unwrap();
        queue.append_eos(1).unwrap();

        let chunks: Vec<Bytes> = queue.chunks(1).collect().await;

        assert_eq!(chunks, vec![Bytes::from_static(b"hello "), Bytes::from_static(b"world")]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn drained_streams_leave_no_bookkeeping() {
        let queue = SegmentQueue::new();
        for stream_id in (1..2000).step_by(2) {
            queue.append(segment(b"body"), stream_id).unwrap();
            queue.append_eos(stream_id).unwrap();
        }

        for stream_id in (1..2000).step_by(2) {
            let chunks: Vec<Bytes> = queue.chunks(stream_id).collect().await;
            assert_eq!(chunks, vec![Bytes::from_static(b"body")]);
        }

        assert!(queue.is_empty());
        assert!(queue.lock().streams.is_empty());
    }

    #[test]
    fn taking_end_of_stream_forgets_the_stream() {
        let queue = SegmentQueue::new();
        queue.append_eos(3).unwrap();
        assert!(queue.has_eos(3));

        assert_eq!(queue.try_pop(3), Some(PayloadItem::Eof));

        assert!(!queue.has_eos(3));
        assert!(queue.lock().streams.is_empty());
    }
}
