//! Engine error types

use thiserror::Error;

/// Errors that can occur during engine operations
///
/// All of these are returned to the immediate caller; nothing is silently
/// swallowed or retried. The render path never produces one mid-block -
/// parameter updates are validated before they reach the live graph.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad construction parameters
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Index or selection outside buffer bounds
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Container header/tag mismatch or truncated data on decode
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// Edit operation on a zero-length selection
    #[error("selection is empty")]
    EmptySelection,

    /// Graph connected twice without disconnecting
    #[error("effect graph is already connected")]
    AlreadyConnected,

    /// Graph operation that requires a connected graph
    #[error("effect graph is not connected")]
    NotConnected,

    /// Transport operation with no buffer loaded
    #[error("no buffer loaded")]
    NoBufferLoaded,

    /// Decode discarded by a cancellation request
    #[error("decode cancelled")]
    DecodeCancelled,

    /// Encode discarded by a cancellation request
    #[error("encode cancelled")]
    EncodeCancelled,

    /// Underlying file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
