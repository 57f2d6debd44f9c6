//! Request text serialization.
//!
//! Renders the pieces of an HTTP/2 request into HTTP/1.1 request text inside a
//! [`Segment`](crate::buffer::Segment):
//!
//! - [`write_request_start`]: the request line built from `:method` and `:path`
//! - [`write_header`]: one `Name: Value` line
//! - [`write_end_of_headers`]: the blank line closing the header section
//!
//! A write that does not fit reports [`EncodeError::TooLarge`](crate::protocol::EncodeError)
//! and leaves the segment as it was.

mod request_encoder;

pub use request_encoder::HOST;
pub use request_encoder::write_end_of_headers;
pub use request_encoder::write_header;
pub use request_encoder::write_request_start;
