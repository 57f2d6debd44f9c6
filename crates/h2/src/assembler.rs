//! The consuming side of the delivery queue.
//!
//! [`RequestAssembler`] collects everything one stream delivered, up to its
//! end-of-stream marker, and parses it back into an [`http::Request`] with `httparse`.
//! Parsing needs a versioned request line, so the producing session must be configured
//! with [`StreamConfig::with_request_version`](crate::protocol::StreamConfig::with_request_version).

use bytes::{Bytes, BytesMut};
use http::{Request, Version};
use http_body_util::Full;
use httparse::Status;
use tracing::{error, trace};

use crate::protocol::{AssembleError, PayloadItem, StreamId};
use crate::queue::SegmentQueue;

/// Maximum number of headers accepted in a reassembled request
const MAX_HEADER_NUM: usize = 64;

/// Drains one stream from a [`SegmentQueue`] into a complete request.
#[derive(Debug)]
pub struct RequestAssembler<'q> {
    queue: &'q SegmentQueue,
    stream_id: StreamId,
    buf: BytesMut,
}

impl<'q> RequestAssembler<'q> {
    pub fn new(queue: &'q SegmentQueue, stream_id: StreamId) -> Self {
        Self { queue, stream_id, buf: BytesMut::new() }
    }

    /// Waits for the stream's end-of-stream marker, then parses what was delivered.
    ///
    /// Taking the marker removes the stream from the queue. If the queue closes first,
    /// the stream is released so nothing is kept for it.
    ///
    /// # Errors
    ///
    /// - [`AssembleError::Incomplete`] if the queue closes before the marker, or the
    ///   delivered bytes end inside the request head
    /// - [`AssembleError::TooManyHeaders`], [`AssembleError::Parse`] and
    ///   [`AssembleError::Request`] for malformed request heads
    pub async fn assemble(mut self) -> Result<Request<Full<Bytes>>, AssembleError> {
        loop {
            match self.queue.pop(self.stream_id).await {
                Some(PayloadItem::Chunk(bytes)) => self.buf.extend_from_slice(&bytes),
                Some(PayloadItem::Eof) => break,
                None => {
                    self.queue.release(self.stream_id);
                    error!(stream_id = self.stream_id, received = self.buf.len(), "queue closed before end of stream");
                    return Err(AssembleError::Incomplete { stream_id: self.stream_id });
                }
            }
        }

        trace!(stream_id = self.stream_id, len = self.buf.len(), "stream drained");
        parse_request(self.stream_id, self.buf.freeze())
    }
}

fn parse_request(stream_id: StreamId, buf: Bytes) -> Result<Request<Full<Bytes>>, AssembleError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let header_len = match req.parse(&buf) {
        Ok(Status::Complete(len)) => len,
        Ok(Status::Partial) => return Err(AssembleError::Incomplete { stream_id }),
        Err(httparse::Error::TooManyHeaders) => return Err(AssembleError::TooManyHeaders { max_num: MAX_HEADER_NUM }),
        Err(e) => {
            error!(stream_id, cause = %e, "failed to parse request head");
            return Err(e.into());
        }
    };

    let version = match req.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };
    let mut builder = Request::builder()
        .method(req.method.unwrap_or_default())
        .uri(req.path.unwrap_or_default())
        .version(version);
    for header in req.headers.iter() {
        builder = builder.header(header.name, header.value);
    }

    let body = buf.slice(header_len..);
    Ok(builder.body(Full::new(body))?)
}
