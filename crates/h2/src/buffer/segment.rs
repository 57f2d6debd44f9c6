use std::fmt;

use bytes::Bytes;
use tracing::error;

use crate::protocol::StreamError;

/// A fixed-capacity byte buffer that batches request text before it is queued.
///
/// The used length never exceeds the capacity: appends write as many leading bytes as
/// fit and report how many that was. A stream owns at most one segment at a time and
/// gives it up for good when it is pushed to the delivery queue.
pub struct Segment {
    buf: Vec<u8>,
    capacity: usize,
}

impl Segment {
    /// Allocates an empty segment able to hold exactly `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::OutOfMemory`] if the allocator refuses the request.
    pub fn with_capacity(capacity: usize) -> Result<Self, StreamError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity).map_err(|e| {
            error!(cause = %e, capacity, "failed to allocate segment");
            StreamError::out_of_memory(capacity)
        })?;
        Ok(Self { buf, capacity })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes that can still be appended
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns true if at least `n` more bytes fit.
    #[inline]
    pub fn has_free(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Appends the leading bytes of `data` that fit and returns how many were written.
    pub fn append(&mut self, data: &[u8]) -> usize {
        let written = data.len().min(self.remaining());
        self.buf.extend_from_slice(&data[..written]);
        written
    }

    /// Appends a short literal the caller has already made room for.
    pub fn concat_text(&mut self, text: &str) {
        let written = self.append(text.as_bytes());
        debug_assert_eq!(written, text.len(), "segment had no room for {text:?}");
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Converts the written bytes into an immutable [`Bytes`].
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

impl AsRef<[u8]> for Segment {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment").field("len", &self.buf.len()).field("capacity", &self.capacity).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_stops_at_capacity() {
        let mut segment = Segment::with_capacity(8).unwrap();

        assert_eq!(segment.append(b"hello"), 5);
        assert!(segment.has_free(3));
        assert!(!segment.has_free(4));

        assert_eq!(segment.append(b" world"), 3);
        assert!(segment.is_full());
        assert_eq!(segment.as_bytes(), b"hello wo");

        assert_eq!(segment.append(b"rld"), 0);
        assert_eq!(segment.len(), 8);
    }

    #[test]
    fn concat_text_appends() {
        let mut segment = Segment::with_capacity(4).unwrap();
        segment.concat_text("\r\n");
        segment.concat_text("\r\n");

        assert_eq!(segment.as_bytes(), b"\r\n\r\n");
        assert_eq!(segment.remaining(), 0);
    }

    #[test]
    fn freeze_keeps_written_bytes_only() {
        let mut segment = Segment::with_capacity(1024).unwrap();
        segment.append(b"abc");

        let bytes = segment.freeze();
        assert_eq!(&bytes[..], b"abc");
    }

    #[test]
    fn impossible_allocation_is_out_of_memory() {
        let err = Segment::with_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, StreamError::OutOfMemory { capacity: usize::MAX }));
    }
}
