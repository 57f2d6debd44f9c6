//! HTTP/2 stream to HTTP/1.1 request reassembly
//!
//! This crate sits inside an HTTP/2 protocol layer, right after frame decoding and header
//! decompression. For every stream it turns the decoded pieces of a request
//! (pseudo-headers, regular headers, body data, end of stream) into flat HTTP/1.1 request
//! text, batched in fixed-capacity segments and handed to a queue shared by all streams
//! of a connection. A downstream worker takes the segments of one stream in order and
//! processes them as an ordinary HTTP/1.1 request.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use micro_h2::protocol::PayloadItem;
//! use micro_h2::queue::SegmentQueue;
//! use micro_h2::session::Session;
//! use micro_h2::stream::Stream;
//!
//! let session = Session::new(1, Arc::new(SegmentQueue::new()));
//! let mut stream = Stream::new(1, &session);
//!
//! stream.add_header(b":method", b"GET").unwrap();
//! stream.add_header(b":path", b"/").unwrap();
//! stream.add_header(b":authority", b"example.com").unwrap();
//! stream.add_header(b"accept", b"*/*").unwrap();
//! stream.end_headers().unwrap();
//! stream.close_input().unwrap();
//!
//! let head = session.queue().try_pop(1).and_then(PayloadItem::into_bytes).unwrap();
//! assert_eq!(&head[..], b"GET /\r\nHost: example.com\r\naccept: */*\r\n\r\n");
//! assert_eq!(session.queue().try_pop(1), Some(PayloadItem::Eof));
//! ```
//!
//! # Architecture
//!
//! - [`stream`]: the per-stream state machine and header ingestion protocol
//! - [`buffer`]: [`Segment`](buffer::Segment), the fixed-capacity output buffer
//! - [`codec`]: request line and header line serialization
//! - [`queue`]: the [`DeliveryQueue`](queue::DeliveryQueue) seam and the in-memory
//!   [`SegmentQueue`](queue::SegmentQueue)
//! - [`session`]: the connection context streams borrow
//! - [`assembler`]: parses a drained stream back into an `http::Request`
//! - [`protocol`]: states, configuration, queue items and errors
//!
//! # Error Handling
//!
//! - [`protocol::StreamError`]: everything a stream operation can fail with
//! - [`protocol::QueueError`]: rejections by the delivery queue
//! - [`protocol::AssembleError`]: failures on the consuming side
//!
//! Only one failure is handled inside a stream: a header line that does not fit the
//! rest of a non-empty segment, which pushes the segment and retries once. Everything
//! else is returned and the caller resets or tears down the stream.
//!
//! # Limitations
//!
//! - No flow control or prioritization, those belong to the session layer
//! - No HPACK, headers arrive already decoded
//! - No network I/O

pub mod assembler;
pub mod buffer;
pub mod codec;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod stream;

mod utils;
pub(crate) use utils::ensure;
