//! The connection context that streams borrow.

use std::sync::Arc;

use crate::protocol::StreamConfig;
use crate::queue::SegmentQueue;

/// Connection identity plus the queue its streams deliver into.
///
/// A session outlives every [`Stream`](crate::stream::Stream) created on it: streams
/// hold a shared borrow for their whole lifetime and never own the session. The queue
/// sits behind an [`Arc`] so consumers on other tasks can hold it too.
#[derive(Debug)]
pub struct Session<Q = SegmentQueue> {
    id: u64,
    queue: Arc<Q>,
    config: StreamConfig,
}

impl<Q> Session<Q> {
    pub fn new(id: u64, queue: Arc<Q>) -> Self {
        Self::with_config(id, queue, StreamConfig::default())
    }

    pub fn with_config(id: u64, queue: Arc<Q>, config: StreamConfig) -> Self {
        Self { id, queue, config }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Returns a shared handle to the queue, for the consuming side.
    pub fn queue_handle(&self) -> Arc<Q> {
        Arc::clone(&self.queue)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}
