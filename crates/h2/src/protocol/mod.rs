//! Protocol types shared by the stream, the codec and the delivery queue.
//!
//! - **State** ([`state`]): [`StreamState`] and the [`StateObserver`] hook
//! - **Messages** ([`message`]): [`PayloadItem`], what the queue hands to consumers
//! - **Configuration** ([`config`]): [`StreamConfig`], per-session stream settings
//! - **Errors** ([`error`]): [`StreamError`] and the errors of each collaborator

/// Identifier of a stream, unique within its session
pub type StreamId = u32;

/// Leading byte that marks a pseudo-header name
pub const PSEUDO_HEADER_PREFIX: u8 = b':';

mod state;
pub use state::StateObserver;
pub use state::StreamState;

mod message;
pub use message::PayloadItem;

mod config;
pub use config::DEFAULT_SEGMENT_CAPACITY;
pub use config::StreamConfig;

mod error;
pub use error::AppendError;
pub use error::AssembleError;
pub use error::EncodeError;
pub use error::QueueError;
pub use error::StreamError;
