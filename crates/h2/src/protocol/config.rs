use http::Version;

/// Capacity of a freshly allocated segment
pub const DEFAULT_SEGMENT_CAPACITY: usize = 16 * 1024;

/// Per-session settings applied to every stream it creates.
///
/// ```
/// use micro_h2::protocol::StreamConfig;
///
/// let config = StreamConfig::default()
///     .with_segment_capacity(4 * 1024)
///     .with_request_version(http::Version::HTTP_11);
/// assert_eq!(config.segment_capacity(), 4 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    segment_capacity: usize,
    request_version: Option<Version>,
}

impl StreamConfig {
    /// Sets the fixed capacity of every segment a stream allocates.
    pub fn with_segment_capacity(mut self, segment_capacity: usize) -> Self {
        self.segment_capacity = segment_capacity;
        self
    }

    /// Appends a protocol version to the request line, e.g. `GET / HTTP/1.1`.
    ///
    /// Without it the request line is the bare `METHOD PATH` form. Only HTTP/1.0 and
    /// HTTP/1.1 can be written.
    pub fn with_request_version(mut self, version: Version) -> Self {
        self.request_version = Some(version);
        self
    }

    pub fn segment_capacity(&self) -> usize {
        self.segment_capacity
    }

    pub fn request_version(&self) -> Option<Version> {
        self.request_version
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { segment_capacity: DEFAULT_SEGMENT_CAPACITY, request_version: None }
    }
}
