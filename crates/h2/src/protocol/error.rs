use http::Version;
use thiserror::Error;

use crate::buffer::Segment;
use crate::protocol::StreamId;

/// Errors surfaced by [`Stream`](crate::stream::Stream) operations.
///
/// None of these are retried across calls. The caller owns the decision to reset or
/// tear down the stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    #[error("too large, needs {needed} bytes but a segment only offers {available}")]
    TooLarge { needed: usize, available: usize },

    #[error("failed to allocate a segment of {capacity} bytes")]
    OutOfMemory { capacity: usize },

    #[error("unsupported request line version: {version:?}")]
    UnsupportedVersion { version: Version },

    #[error("delivery queue error: {source}")]
    Queue {
        #[from]
        source: QueueError,
    },
}

impl StreamError {
    pub fn protocol_violation<S: Into<String>>(reason: S) -> Self {
        Self::ProtocolViolation { reason: reason.into() }
    }

    pub fn too_large(needed: usize, available: usize) -> Self {
        Self::TooLarge { needed, available }
    }

    pub fn out_of_memory(capacity: usize) -> Self {
        Self::OutOfMemory { capacity }
    }

    /// Returns true if this is a header ordering or validation failure.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}

impl From<EncodeError> for StreamError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::TooLarge { needed, available } => Self::TooLarge { needed, available },
            EncodeError::UnsupportedVersion(version) => Self::UnsupportedVersion { version },
        }
    }
}

/// Errors produced while serializing request text into a segment.
///
/// `TooLarge` only says the write did not fit the remaining room of the segment it was
/// attempted on; whether a fresh segment would help is for the caller to decide.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("name too long, needs {needed} bytes but only {available} left")]
    TooLarge { needed: usize, available: usize },

    #[error("unsupported http version {0:?}")]
    UnsupportedVersion(Version),
}

impl EncodeError {
    pub fn too_large(needed: usize, available: usize) -> Self {
        Self::TooLarge { needed, available }
    }
}

/// Failures reported by a [`DeliveryQueue`](crate::queue::DeliveryQueue).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("delivery queue is closed")]
    Closed,

    #[error("stream {stream_id} already ended")]
    StreamEnded { stream_id: StreamId },
}

/// A rejected segment append.
///
/// The queue hands the segment back so the producer keeps ownership of bytes that
/// were not delivered.
#[derive(Error, Debug)]
#[error("failed to append segment: {source}")]
pub struct AppendError {
    segment: Segment,
    #[source]
    source: QueueError,
}

impl AppendError {
    pub fn new(segment: Segment, source: QueueError) -> Self {
        Self { segment, source }
    }

    pub fn error(&self) -> &QueueError {
        &self.source
    }

    pub fn into_parts(self) -> (Segment, QueueError) {
        (self.segment, self.source)
    }
}

/// Errors produced while turning delivered segments back into an [`http::Request`].
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("stream {stream_id} ended before a complete request was delivered")]
    Incomplete { stream_id: StreamId },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid request head: {source}")]
    Parse {
        #[from]
        source: httparse::Error,
    },

    #[error("invalid request: {source}")]
    Request {
        #[from]
        source: http::Error,
    },
}
