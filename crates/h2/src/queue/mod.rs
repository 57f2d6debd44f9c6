//! The delivery queue between streams and downstream request processing.
//!
//! Streams are producers: they append pushed segments and one end-of-stream marker per
//! stream id. Implementations synchronize internally, keep items of one stream id in
//! append order, and promise nothing about the order across streams.

mod segment_queue;

pub use segment_queue::SegmentQueue;

use crate::buffer::Segment;
use crate::protocol::{AppendError, QueueError, StreamId};

/// An ordered, multi-producer sink keyed by stream id.
#[cfg_attr(test, mockall::automock)]
pub trait DeliveryQueue: Send + Sync {
    /// Takes ownership of `segment` as the next chunk of `stream_id`.
    ///
    /// On failure the segment is handed back inside the [`AppendError`].
    fn append(&self, segment: Segment, stream_id: StreamId) -> Result<(), AppendError>;

    /// Marks the end of `stream_id`'s input. Nothing may follow it for that id.
    fn append_eos(&self, stream_id: StreamId) -> Result<(), QueueError>;
}
