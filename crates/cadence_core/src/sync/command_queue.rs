//! # Double-Buffered Command Queue
//!
//! Two arenas per direction. Producers append to the write side; the
//! consumer owns the read side outright and exchanges it with the write
//! side once per drain cycle.
//!
//! ```text
//! Frame N:   producers ──► B (write)        consumer reads A
//!            consumer: A fully processed, A.clear()
//! swap:      lock { A <-> B }
//! Frame N+1: producers ──► A (write)        consumer reads B
//! ```
//!
//! ## Record Layout
//!
//! ```text
//! ┌────────┬──────────┬─────────────┬──────────┬───────────────────┐
//! │ kind   │ reserved │ payload_len │ next     │ payload ...        │
//! │ u32    │ u32      │ u64         │ u64      │ payload_len bytes  │
//! └────────┴──────────┴─────────────┴──────────┴───────────────────┘
//! ```
//!
//! `next` is the offset of the following record. For the last record it
//! equals the arena's write cursor, which is how iteration ends.
//!
//! ## Ordering Contract
//!
//! The consumer must process every record and call [`CommandReader::clear`]
//! before the next [`CommandReader::swap`]. A swap on a non-empty read side
//! is rejected and nothing moves.

use std::mem;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::error::{CoreError, CoreResult};
use crate::memory::Arena;
use crate::sync::spinlock::Spinlock;

/// One mebibyte. Default backing size of each queue arena.
pub const MEGABYTE: usize = 1024 * 1024;

/// Fixed-size header in front of every record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RecordHeader {
    /// Command kind tag. Meaning is owned by the protocol layer.
    pub kind: u32,
    /// Always zero. Keeps the header free of padding.
    pub reserved: u32,
    /// Payload size in bytes.
    pub payload_len: u64,
    /// Offset of the next record (or the write cursor for the last one).
    pub next: u64,
}

impl RecordHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = mem::size_of::<Self>();
}

/// A record borrowed from the read side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandRecord<'a> {
    /// Command kind tag.
    pub kind: u32,
    /// Offset of this record's header.
    pub offset: usize,
    /// Offset of the next record.
    pub next: usize,
    /// Payload bytes.
    pub payload: &'a [u8],
}

struct Shared {
    write: Spinlock<Arena>,
}

/// Creates a queue whose two arenas each start with `capacity` bytes.
///
/// The writer is `Clone + Send + Sync`; hand one to every producer. The
/// reader stays with the single consumer.
#[must_use]
pub fn command_queue(capacity: usize) -> (CommandWriter, CommandReader) {
    let shared = Arc::new(Shared {
        write: Spinlock::new(Arena::with_capacity(capacity)),
    });
    let writer = CommandWriter {
        shared: Arc::clone(&shared),
    };
    let reader = CommandReader {
        shared,
        read: Arena::with_capacity(capacity),
        swaps: 0,
    };
    (writer, reader)
}

/// Producer half of a command queue.
#[derive(Clone)]
pub struct CommandWriter {
    shared: Arc<Shared>,
}

impl CommandWriter {
    /// Appends one record.
    ///
    /// The lock is held only for the copy. Build the payload first.
    ///
    /// Returns the record's offset within the current write arena.
    pub fn push_command(&self, kind: u32, payload: &[u8]) -> usize {
        self.push_parts(kind, &[payload])
    }

    /// Appends one record whose payload is a plain-old-data struct.
    pub fn push_pod<T: Pod>(&self, kind: u32, payload: &T) -> usize {
        self.push_parts(kind, &[bytemuck::bytes_of(payload)])
    }

    /// Appends one record whose payload is the concatenation of `parts`.
    ///
    /// Used for a fixed struct followed by variable-length trailing data.
    pub fn push_parts(&self, kind: u32, parts: &[&[u8]]) -> usize {
        let payload_len: usize = parts.iter().map(|part| part.len()).sum();

        let mut arena = self.shared.write.lock();
        let offset = arena.top();
        let next = offset + RecordHeader::SIZE + payload_len;
        arena.push_pod(&RecordHeader {
            kind,
            reserved: 0,
            payload_len: payload_len as u64,
            next: next as u64,
        });
        for part in parts {
            arena.push_bytes(part);
        }
        debug_assert_eq!(arena.top(), next);
        offset
    }

    /// Bytes waiting for the next swap.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.shared.write.lock().len()
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter")
            .field("pending_bytes", &self.pending_bytes())
            .finish()
    }
}

/// Consumer half of a command queue.
pub struct CommandReader {
    shared: Arc<Shared>,
    read: Arena,
    swaps: u64,
}

impl CommandReader {
    /// Exchanges the read and write arenas.
    ///
    /// After a successful swap the read side holds everything producers
    /// pushed since the previous swap, and producers continue into the
    /// just-drained arena.
    ///
    /// Returns the number of bytes now readable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadQueueNotDrained`] if the previous batch was
    /// not cleared. Neither arena is touched in that case.
    pub fn swap(&mut self) -> CoreResult<usize> {
        if !self.read.is_empty() {
            return Err(CoreError::ReadQueueNotDrained {
                pending_bytes: self.read.len(),
            });
        }
        {
            let mut write = self.shared.write.lock();
            mem::swap(&mut *write, &mut self.read);
        }
        self.swaps += 1;
        tracing::trace!(bytes = self.read.len(), swap = self.swaps, "command queue swap");
        Ok(self.read.len())
    }

    /// Returns the record after `prev`, or the first record if `prev` is `None`.
    ///
    /// Returns `None` once the end sentinel is reached or if a header is
    /// malformed (see [`CommandReader::validate`]).
    #[must_use]
    pub fn read_iter(&self, prev: Option<&CommandRecord<'_>>) -> Option<CommandRecord<'_>> {
        let offset = match prev {
            None => 0,
            Some(record) => record.next,
        };
        self.record_at(offset).ok().flatten()
    }

    /// Iterates every record in the read side in push order.
    #[must_use]
    pub fn records(&self) -> Records<'_> {
        Records {
            reader: self,
            offset: 0,
        }
    }

    /// Walks every header and reports the first inconsistency.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptRecord`] at the first bad header.
    pub fn validate(&self) -> CoreResult<usize> {
        let mut offset = 0;
        let mut count = 0;
        while let Some(record) = self.record_at(offset)? {
            offset = record.next;
            count += 1;
        }
        Ok(count)
    }

    /// Marks the read side as fully processed. Required before the next swap.
    #[inline]
    pub fn clear(&mut self) {
        self.read.clear();
    }

    /// Bytes still sitting in the read side.
    #[inline]
    #[must_use]
    pub const fn pending_bytes(&self) -> usize {
        self.read.len()
    }

    /// True if the read side has been cleared.
    #[inline]
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.read.is_empty()
    }

    /// Number of successful swaps so far.
    #[inline]
    #[must_use]
    pub const fn swap_count(&self) -> u64 {
        self.swaps
    }

    /// Creates another producer handle for this queue.
    #[must_use]
    pub fn writer(&self) -> CommandWriter {
        CommandWriter {
            shared: Arc::clone(&self.shared),
        }
    }

    fn record_at(&self, offset: usize) -> CoreResult<Option<CommandRecord<'_>>> {
        let end = self.read.len();
        if offset >= end {
            return Ok(None);
        }
        let header: RecordHeader = self
            .read
            .read_pod(offset)
            .ok_or(CoreError::CorruptRecord { offset })?;
        let payload_start = offset + RecordHeader::SIZE;
        let corrupt = CoreError::CorruptRecord { offset };
        let next = usize::try_from(header.next).map_err(|_| corrupt.clone())?;
        let payload_len = usize::try_from(header.payload_len).map_err(|_| corrupt.clone())?;
        if payload_start.checked_add(payload_len) != Some(next) || next > end {
            return Err(corrupt);
        }
        let payload = self
            .read
            .get(payload_start, payload_len)
            .ok_or(corrupt)?;
        Ok(Some(CommandRecord {
            kind: header.kind,
            offset,
            next,
            payload,
        }))
    }
}

impl std::fmt::Debug for CommandReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandReader")
            .field("pending_bytes", &self.read.len())
            .field("swaps", &self.swaps)
            .finish_non_exhaustive()
    }
}

/// Iterator over the read side of a [`CommandReader`].
#[derive(Debug)]
pub struct Records<'a> {
    reader: &'a CommandReader,
    offset: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = CommandRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.record_at(self.offset) {
            Ok(Some(record)) => {
                self.offset = record.next;
                Some(record)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::error!(%err, "stopping command iteration");
                self.offset = usize::MAX;
                None
            }
        }
    }
}
