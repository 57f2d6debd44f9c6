//! Serializes request lines and header fields into a [`Segment`].
//!
//! Every write is all-or-nothing: the full length is measured first and the segment is
//! left untouched when it does not fit, so a caller can push the segment and retry on a
//! fresh one without cleaning up a half-written line.
//!
//! Produced text:
//!
//! ```text
//! METHOD SP PATH [SP VERSION] CRLF
//! Name: Value CRLF
//! CRLF
//! ```

use http::Version;
use tracing::error;

use crate::buffer::Segment;
use crate::protocol::EncodeError;

const SP: &[u8] = b" ";
const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b": ";

/// Name of the header synthesized from the `:authority` pseudo-header
pub const HOST: &[u8] = b"Host";

/// Writes the request line `METHOD PATH`, with the version appended when given.
///
/// # Errors
///
/// - [`EncodeError::TooLarge`] if the line does not fit the remaining room
/// - [`EncodeError::UnsupportedVersion`] for versions other than HTTP/1.0 and HTTP/1.1
pub fn write_request_start(
    dst: &mut Segment,
    method: &[u8],
    path: &[u8],
    version: Option<Version>,
) -> Result<(), EncodeError> {
    let version = match version {
        None => None,
        Some(Version::HTTP_10) => Some("HTTP/1.0"),
        Some(Version::HTTP_11) => Some("HTTP/1.1"),
        Some(v) => {
            error!(http_version = ?v, "unsupported http version");
            return Err(EncodeError::UnsupportedVersion(v));
        }
    };

    match version {
        Some(version) => put_all(dst, &[method, SP, path, SP, version.as_bytes(), CRLF]),
        None => put_all(dst, &[method, SP, path, CRLF]),
    }
}

/// Writes one `Name: Value` header line.
///
/// # Errors
///
/// [`EncodeError::TooLarge`] if the line does not fit the remaining room, even when
/// the segment is empty.
pub fn write_header(dst: &mut Segment, name: &[u8], value: &[u8]) -> Result<(), EncodeError> {
    put_all(dst, &[name, HEADER_SEPARATOR, value, CRLF])
}

/// Writes the blank line that terminates the header section.
pub fn write_end_of_headers(dst: &mut Segment) -> Result<(), EncodeError> {
    if !dst.has_free(CRLF.len()) {
        return Err(EncodeError::too_large(CRLF.len(), dst.remaining()));
    }
    dst.concat_text("\r\n");
    Ok(())
}

fn put_all(dst: &mut Segment, parts: &[&[u8]]) -> Result<(), EncodeError> {
    let needed = parts.iter().map(|part| part.len()).sum();
    if !dst.has_free(needed) {
        return Err(EncodeError::too_large(needed, dst.remaining()));
    }

    for part in parts {
        dst.append(part);
    }
    Ok(())
}
