//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by arenas and command queues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A read or write fell outside the arena's live bytes.
    #[error("arena access out of bounds: offset {offset} + {len} bytes exceeds {live} live bytes")]
    OutOfBounds {
        /// Requested offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Live bytes in the arena.
        live: usize,
    },

    /// Tried to pop more bytes than the arena holds.
    #[error("arena underflow: cannot pop {requested} bytes from {live} live bytes")]
    Underflow {
        /// Bytes requested.
        requested: usize,
        /// Live bytes in the arena.
        live: usize,
    },

    /// The consumer asked for a swap before draining the previous batch.
    #[error("read queue not drained: {pending_bytes} bytes still pending")]
    ReadQueueNotDrained {
        /// Bytes left in the read side.
        pending_bytes: usize,
    },

    /// A record header points outside the queue or backwards.
    #[error("corrupt command record at offset {offset}")]
    CorruptRecord {
        /// Offset of the bad header.
        offset: usize,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
