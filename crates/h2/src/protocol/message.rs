use bytes::{Buf, Bytes};

/// An item delivered through the queue for one stream.
///
/// Streams produce zero or more chunks of request text followed by exactly one
/// [`PayloadItem::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A pushed segment, frozen
    Chunk(Data),
    /// Marks the end of the stream's input
    Eof,
}

impl PayloadItem {
    /// Consumes the PayloadItem and returns the contained bytes if this is a Chunk
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}
