use crate::types::Rank;

pub type Result<T> = std::result::Result<T, StrataError>;

#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("out of resources: cannot allocate {bytes} bytes for {what}")]
    OutOfResource { what: &'static str, bytes: usize },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: Rank, world_size: u32 },

    #[error("descriptor has {actual} entries, communicator needs {expected}")]
    DescriptorLength { expected: usize, actual: usize },

    #[error("negative count {value} at descriptor index {index}")]
    InvalidCount { index: usize, value: i64 },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("access of {len} bytes at offset {offset} is outside a buffer of {capacity} bytes")]
    BufferOutOfBounds {
        offset: isize,
        len: usize,
        capacity: usize,
    },

    #[error("message decode failed: {0}")]
    DecodeFailed(String),

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },

    #[error("{operation}: node leader cannot forward bytes between differing data representations")]
    HeterogeneousBroker { operation: &'static str },

    #[error("topology error: {reason}")]
    Topology { reason: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl StrataError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn out_of_resource(what: &'static str, bytes: usize) -> Self {
        Self::OutOfResource { what, bytes }
    }

    /// True for the resource-exhaustion class of failures.
    pub fn is_out_of_resource(&self) -> bool {
        matches!(self, Self::OutOfResource { .. })
    }
}
