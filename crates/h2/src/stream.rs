//! Per-stream request reassembly.
//!
//! A [`Stream`] receives the decoded pieces of one HTTP/2 request from the frame layer
//! and turns them into HTTP/1.1 request text:
//!
//! ```text
//! METHOD SP PATH CRLF
//! Host: AUTHORITY CRLF        (when :authority was given)
//! Name: Value CRLF            (zero or more)
//! CRLF
//! body bytes...
//! ```
//!
//! The text accumulates in one [`Segment`] at a time. Full segments are pushed to the
//! session's [`DeliveryQueue`] tagged with the stream id, and closing the input pushes
//! whatever is left followed by a single end-of-stream marker.
//!
//! # Header ordering
//!
//! Pseudo-headers (`:method`, `:scheme`, `:path`, `:authority`) must all arrive before
//! the first regular header, which is when the request line gets written. `:method`
//! and `:path` are mandatory. Violations fail with
//! [`StreamError::ProtocolViolation`] and the caller is expected to reset the stream.
//!
//! # Segment rollover
//!
//! A header line that does not fit the rest of a non-empty segment makes the stream
//! push that segment and retry the line once on a fresh one. A line that does not fit
//! an empty segment fails with [`StreamError::TooLarge`].

use std::fmt;

use bytes::Bytes;
use http::response::Parts;
use tracing::{debug, error, info, trace, warn};

use crate::buffer::Segment;
use crate::codec;
use crate::ensure;
use crate::protocol::{
    EncodeError, PSEUDO_HEADER_PREFIX, StateObserver, StreamError, StreamId, StreamState,
};
use crate::queue::{DeliveryQueue, SegmentQueue};
use crate::session::Session;

/// One request being reassembled, borrowing the [`Session`] it belongs to.
///
/// Dropping the stream releases the segment it still owns and any response head.
pub struct Stream<'s, Q = SegmentQueue> {
    id: StreamId,
    session: &'s Session<Q>,
    state: StreamState,

    method: Option<Bytes>,
    scheme: Option<Bytes>,
    path: Option<Bytes>,
    authority: Option<Bytes>,

    /// Set once the request line has been written
    request_started: bool,
    end_of_headers: bool,
    aborted: bool,
    eos_sent: bool,

    work: Option<Segment>,
    response_head: Option<Parts>,
    observer: Option<Box<dyn StateObserver + 's>>,
}

impl<'s, Q: DeliveryQueue> Stream<'s, Q> {
    /// Creates an idle stream on `session`.
    pub fn new(id: StreamId, session: &'s Session<Q>) -> Self {
        trace!(session_id = session.id(), stream_id = id, "stream created");
        Self {
            id,
            session,
            state: StreamState::Idle,
            method: None,
            scheme: None,
            path: None,
            authority: None,
            request_started: false,
            end_of_headers: false,
            aborted: false,
            eos_sent: false,
            work: None,
            response_head: None,
            observer: None,
        }
    }

    /// Installs the observer notified on every actual state change, replacing any
    /// previous one.
    pub fn set_state_observer<O: StateObserver + 's>(&mut self, observer: O) {
        self.observer = Some(Box::new(observer));
    }

    /// Feeds one decoded header field.
    ///
    /// Empty names are ignored. Names starting with `:` are pseudo-headers and their
    /// raw octets are stored. Everything else is written as a header line, preceded by the request
    /// line when it is the first one.
    ///
    /// # Errors
    ///
    /// - [`StreamError::ProtocolViolation`] for a pseudo-header after the request
    ///   started, a pseudo-header without value or repeated, a regular header before
    ///   `:method` and `:path`, or any header after the input was closed
    /// - [`StreamError::TooLarge`] if the line does not even fit an empty segment
    /// - [`StreamError::OutOfMemory`] and [`StreamError::Queue`] from allocation and
    ///   delivery
    pub fn add_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), StreamError> {
        if name.is_empty() {
            return Ok(());
        }
        ensure!(!self.state.is_input_closed(), self.violation("header after end of stream"));

        if name.first() == Some(&PSEUDO_HEADER_PREFIX) {
            self.add_pseudo_header(name, value)
        } else {
            self.add_regular_header(name, value)
        }
    }

    fn add_pseudo_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), StreamError> {
        ensure!(
            !self.request_started && self.work.is_none(),
            self.violation("pseudo header after request start")
        );
        ensure!(
            !value.is_empty(),
            self.violation(format!("pseudo header without value {}", String::from_utf8_lossy(name)))
        );

        let slot = match name {
            b":method" => &mut self.method,
            b":scheme" => &mut self.scheme,
            b":path" => &mut self.path,
            b":authority" => &mut self.authority,
            _ => {
                info!(
                    session_id = self.session.id(),
                    stream_id = self.id,
                    name = %String::from_utf8_lossy(name),
                    "ignoring unknown pseudo header"
                );
                return Ok(());
            }
        };

        if slot.is_some() {
            return Err(self.violation(format!("duplicate pseudo header {}", String::from_utf8_lossy(name))));
        }

        *slot = Some(Bytes::copy_from_slice(value));
        Ok(())
    }

    fn add_regular_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), StreamError> {
        if !self.request_started {
            self.start_request()?;
        }
        self.write_with_rollover(|work| codec::write_header(work, name, value))
    }

    /// Writes the request line and the `Host` header synthesized from `:authority`.
    fn start_request(&mut self) -> Result<(), StreamError> {
        let session = self.session;
        let Some(method) = self.method.as_ref() else {
            return Err(self.violation("header start but :method missing"));
        };
        let Some(path) = self.path.as_ref() else {
            return Err(self.violation("header start but :path missing"));
        };

        let config = session.config();
        let work = match self.work.take() {
            Some(work) => work,
            None => Segment::with_capacity(config.segment_capacity())?,
        };
        let work = self.work.insert(work);
        codec::write_request_start(work, method, path, config.request_version())?;
        self.request_started = true;

        if let Some(authority) = self.authority.clone() {
            self.write_with_rollover(|work| codec::write_header(work, codec::HOST, &authority))?;
        }
        Ok(())
    }

    /// Feeds a chunk of request body.
    ///
    /// The bytes fill the current segment; each time it runs full with bytes left over
    /// it is pushed and the rest continues in a fresh segment. The last, partially
    /// filled segment stays with the stream until the next push.
    pub fn add_data(&mut self, data: &[u8]) -> Result<(), StreamError> {
        ensure!(!self.state.is_input_closed(), self.violation("data after end of stream"));

        let mut rest = data;
        loop {
            let work = self.ensure_work()?;
            let written = work.append(rest);
            rest = &rest[written..];
            if rest.is_empty() {
                return Ok(());
            }
            // zero capacity segments would never make progress
            ensure!(written > 0 || !work.is_empty(), StreamError::too_large(rest.len(), work.capacity()));

            self.push()?;
        }
    }

    /// Terminates the header section and pushes it right away.
    ///
    /// Writes the request line first if no regular header did, so `:method` and
    /// `:path` are required here as well.
    pub fn end_headers(&mut self) -> Result<(), StreamError> {
        ensure!(!self.state.is_input_closed(), self.violation("end of headers after end of stream"));

        if !self.request_started {
            self.start_request()?;
        }
        self.ensure_work()?;
        self.end_of_headers = true;

        self.write_with_rollover(codec::write_end_of_headers)?;
        trace!(session_id = self.session.id(), stream_id = self.id, "headers done");
        self.push()
    }

    /// Hands the current segment to the queue.
    ///
    /// A no-op without a segment, and an empty segment is dropped instead of delivered.
    /// If the queue rejects it the stream keeps the segment.
    pub fn push(&mut self) -> Result<(), StreamError> {
        let Some(work) = self.work.take() else {
            return Ok(());
        };
        if work.is_empty() {
            return Ok(());
        }

        debug!(
            session_id = self.session.id(),
            stream_id = self.id,
            method = ?self.method,
            path = ?self.path,
            authority = ?self.authority,
            len = work.len(),
            "pushing request segment"
        );

        if let Err(e) = self.session.queue().append(work, self.id) {
            let (work, source) = e.into_parts();
            warn!(session_id = self.session.id(), stream_id = self.id, cause = %source, "failed to push segment");
            self.work = Some(work);
            return Err(source.into());
        }
        Ok(())
    }

    /// Closes the input half: the peer will send nothing more.
    ///
    /// Pushes any pending segment, then appends the end-of-stream marker. The marker is
    /// appended once per stream no matter how often this is called.
    pub fn close_input(&mut self) -> Result<(), StreamError> {
        let next = self.state.on_close_input();
        self.set_state(next);

        if self.eos_sent {
            return Ok(());
        }

        self.push()?;
        self.session.queue().append_eos(self.id)?;
        self.eos_sent = true;

        trace!(session_id = self.session.id(), stream_id = self.id, "got eos");
        Ok(())
    }

    /// Closes the output half, called by the response side once it is done.
    pub fn close_output(&mut self) {
        let next = self.state.on_close_output();
        self.set_state(next);
    }

    /// Flags the stream so collaborators stop processing it.
    ///
    /// Touches neither the state, the segment nor the queue.
    pub fn abort(&mut self) {
        if !self.aborted {
            self.aborted = true;
            debug!(session_id = self.session.id(), stream_id = self.id, "stream aborted");
        }
    }

    /// Releases the stream and everything it still owns.
    pub fn destroy(self) {
        drop(self);
    }

    /// Attempts `write` on the current segment; if it does not fit a non-empty segment,
    /// pushes that segment and attempts once more on a fresh one.
    fn write_with_rollover<F>(&mut self, write: F) -> Result<(), StreamError>
    where
        F: Fn(&mut Segment) -> Result<(), EncodeError>,
    {
        let work = self.ensure_work()?;
        match write(&mut *work) {
            Ok(()) => return Ok(()),
            Err(EncodeError::TooLarge { .. }) if !work.is_empty() => {}
            Err(e) => return Err(e.into()),
        }

        trace!(session_id = self.session.id(), stream_id = self.id, "segment full, rolling over");
        self.push()?;

        let work = self.ensure_work()?;
        write(work).map_err(StreamError::from)
    }

    fn ensure_work(&mut self) -> Result<&mut Segment, StreamError> {
        let work = match self.work.take() {
            Some(work) => work,
            None => Segment::with_capacity(self.session.config().segment_capacity())?,
        };
        Ok(self.work.insert(work))
    }

    fn set_state(&mut self, state: StreamState) {
        if self.state == state {
            return;
        }

        let old = std::mem::replace(&mut self.state, state);
        trace!(session_id = self.session.id(), stream_id = self.id, %old, new = %state, "state changed");
        if let Some(observer) = self.observer.as_mut() {
            observer.on_state_change(self.id, old, state);
        }
    }

    fn violation<S: Into<String>>(&self, reason: S) -> StreamError {
        let err = StreamError::protocol_violation(reason);
        error!(session_id = self.session.id(), stream_id = self.id, cause = %err, "protocol violation");
        err
    }
}

impl<Q> Stream<'_, Q> {
    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn method(&self) -> Option<&[u8]> {
        self.method.as_deref()
    }

    pub fn scheme(&self) -> Option<&[u8]> {
        self.scheme.as_deref()
    }

    pub fn path(&self) -> Option<&[u8]> {
        self.path.as_deref()
    }

    pub fn authority(&self) -> Option<&[u8]> {
        self.authority.as_deref()
    }

    pub fn is_end_of_headers(&self) -> bool {
        self.end_of_headers
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Bytes written but not yet pushed
    pub fn pending_len(&self) -> usize {
        self.work.as_ref().map_or(0, Segment::len)
    }

    /// Stores the response head produced for this stream.
    pub fn set_response_head(&mut self, head: Parts) {
        self.response_head = Some(head);
    }

    pub fn response_head(&self) -> Option<&Parts> {
        self.response_head.as_ref()
    }

    pub fn take_response_head(&mut self) -> Option<Parts> {
        self.response_head.take()
    }
}

impl<Q> Drop for Stream<'_, Q> {
    fn drop(&mut self) {
        if let Some(work) = self.work.take() {
            trace!(stream_id = self.id, len = work.len(), "dropping undelivered segment");
        }
    }
}

impl<Q> fmt::Debug for Stream<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id)
            .field("session_id", &self.session.id())
            .field("state", &self.state)
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("path", &self.path)
            .field("authority", &self.authority)
            .field("end_of_headers", &self.end_of_headers)
            .field("aborted", &self.aborted)
            .field("work", &self.work)
            .finish_non_exhaustive()
    }
}
