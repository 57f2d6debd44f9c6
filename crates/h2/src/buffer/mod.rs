//! Fixed-capacity output buffers.
//!
//! A [`Segment`] is the unit of hand-off between a stream and the delivery queue.

mod segment;

pub use segment::Segment;
