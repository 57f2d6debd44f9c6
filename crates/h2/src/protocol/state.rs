//! Stream lifecycle states and the closing transitions between them.
//!
//! Closure only ever grows: a stream starts [`StreamState::Idle`], closes its input
//! and output halves in either order, and ends [`StreamState::Closed`]. Both closing
//! events are total over every state, repeated closes are no-ops.

use std::fmt;

use crate::protocol::StreamId;

/// Lifecycle state of a single stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Initial state, both halves open.
    Idle,
    /// The peer finished sending the request.
    ClosedInput,
    /// The response side finished sending.
    ClosedOutput,
    /// Terminal, both halves closed.
    Closed,
}

impl StreamState {
    /// State reached when the input half closes.
    pub fn on_close_input(self) -> Self {
        match self {
            Self::Idle => Self::ClosedInput,
            Self::ClosedInput => Self::ClosedInput,
            Self::ClosedOutput => Self::Closed,
            Self::Closed => Self::Closed,
        }
    }

    /// State reached when the output half closes.
    pub fn on_close_output(self) -> Self {
        match self {
            Self::Idle => Self::ClosedOutput,
            Self::ClosedInput => Self::Closed,
            Self::ClosedOutput => Self::ClosedOutput,
            Self::Closed => Self::Closed,
        }
    }

    #[inline]
    pub fn is_input_closed(self) -> bool {
        matches!(self, Self::ClosedInput | Self::Closed)
    }

    #[inline]
    pub fn is_output_closed(self) -> bool {
        matches!(self, Self::ClosedOutput | Self::Closed)
    }

    #[inline]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ClosedInput => "closed_input",
            Self::ClosedOutput => "closed_output",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives every actual state change of a stream, synchronously.
///
/// Closures taking `(stream_id, old, new)` implement this trait, so typed context is
/// captured by the closure rather than passed around.
pub trait StateObserver: Send {
    fn on_state_change(&mut self, stream_id: StreamId, old: StreamState, new: StreamState);
}

impl<F> StateObserver for F
where
    F: FnMut(StreamId, StreamState, StreamState) + Send,
{
    fn on_state_change(&mut self, stream_id: StreamId, old: StreamState, new: StreamState) {
        self(stream_id, old, new);
    }
}

#[cfg(test)]
mod tests {
    use super::StreamState::{self, *};

    const ALL: [StreamState; 4] = [Idle, ClosedInput, ClosedOutput, Closed];

    #[test]
    fn close_input_table() {
        assert_eq!(Idle.on_close_input(), ClosedInput);
        assert_eq!(ClosedInput.on_close_input(), ClosedInput);
        assert_eq!(ClosedOutput.on_close_input(), Closed);
        assert_eq!(Closed.on_close_input(), Closed);
    }

    #[test]
    fn close_output_mirrors_close_input() {
        assert_eq!(Idle.on_close_output(), ClosedOutput);
        assert_eq!(ClosedOutput.on_close_output(), ClosedOutput);
        assert_eq!(ClosedInput.on_close_output(), Closed);
        assert_eq!(Closed.on_close_output(), Closed);
    }

    #[test]
    fn closing_never_reopens() {
        for state in ALL {
            let after_input = state.on_close_input();
            let after_output = state.on_close_output();

            assert!(after_input.is_input_closed());
            assert!(after_output.is_output_closed());
            assert_eq!(state.is_output_closed(), after_input.is_output_closed());
            assert_eq!(state.is_input_closed(), after_output.is_input_closed());
            assert!(after_input.on_close_output().is_closed());
            assert!(after_output.on_close_input().is_closed());
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(ClosedInput.to_string(), "closed_input");
        assert_eq!(Idle.to_string(), "idle");
    }
}
