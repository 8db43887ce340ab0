//! # Arena Allocator
//!
//! A growable bump allocator over raw bytes.
//!
//! ```text
//! 0                      curr                 capacity
//! ├──────── live ────────┼─────── free ───────┤
//! ```
//!
//! Growth doubles the capacity (minimum 8 bytes) or jumps straight to the
//! requested size, whichever is larger. Growth moves the buffer, so callers
//! keep offsets and re-borrow after every push.

use bytemuck::Pod;

use crate::error::{CoreError, CoreResult};

/// Smallest capacity an arena grows to.
const MIN_GROWTH: usize = 8;

/// A growable bump-pointer arena.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Share it behind a [`crate::Spinlock`].
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::with_capacity(64);
///
/// let offset = arena.push_pod(&42u32);
/// assert_eq!(arena.read_pod::<u32>(offset), Some(42));
///
/// arena.clear(); // memory retained
/// ```
#[derive(Debug, Default, Clone)]
pub struct Arena {
    /// Backing storage. `data.len()` is the capacity.
    data: Vec<u8>,
    /// Offset of the first unused byte.
    curr: usize,
}

impl Arena {
    /// Creates an empty arena without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            curr: 0,
        }
    }

    /// Creates an arena with `capacity` zeroed bytes reserved.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Initial size in bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            curr: 0,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of live bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.curr
    }

    /// Returns true if nothing has been pushed since the last clear.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.curr == 0
    }

    /// Returns the remaining free space in bytes before the next growth.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.curr
    }

    /// Offset of the first unused byte.
    ///
    /// The next `push` returns exactly this offset.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> usize {
        self.curr
    }

    /// Reserves `size` zeroed bytes and returns their offset.
    ///
    /// Grows the buffer if needed. Growth is amortized O(1).
    ///
    /// # Panics
    ///
    /// Aborts the process if the allocator cannot satisfy the growth.
    pub fn push(&mut self, size: usize) -> usize {
        let offset = self.curr;
        let end = offset + size;
        if end > self.data.len() {
            self.grow(end);
        }
        self.data[offset..end].fill(0);
        self.curr = end;
        offset
    }

    /// Copies `bytes` into the arena and returns their offset.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.push(bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        offset
    }

    /// Copies a plain-old-data value into the arena and returns its offset.
    ///
    /// No alignment padding is inserted. Read it back with [`Arena::read_pod`].
    #[inline]
    pub fn push_pod<T: Pod>(&mut self, value: &T) -> usize {
        self.push_bytes(bytemuck::bytes_of(value))
    }

    /// Copies a slice of plain-old-data values and returns the offset of the first.
    #[inline]
    pub fn push_slice<T: Pod>(&mut self, values: &[T]) -> usize {
        self.push_bytes(bytemuck::cast_slice(values))
    }

    /// Borrows `len` live bytes starting at `offset`.
    ///
    /// Returns `None` if the range runs past the live region.
    #[must_use]
    pub fn get(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.curr {
            return None;
        }
        Some(&self.data[offset..end])
    }

    /// Mutably borrows `len` live bytes starting at `offset`.
    #[must_use]
    pub fn get_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        if end > self.curr {
            return None;
        }
        Some(&mut self.data[offset..end])
    }

    /// Reads a plain-old-data value at `offset`.
    ///
    /// The read is unaligned, so any offset returned by a push is valid.
    #[must_use]
    pub fn read_pod<T: Pod>(&self, offset: usize) -> Option<T> {
        self.get(offset, std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
    }

    /// Overwrites a plain-old-data value already pushed at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfBounds`] if the value would extend past the
    /// live region.
    pub fn write_pod<T: Pod>(&mut self, offset: usize, value: &T) -> CoreResult<()> {
        let len = std::mem::size_of::<T>();
        let live = self.curr;
        let slot = self
            .get_mut(offset, len)
            .ok_or(CoreError::OutOfBounds { offset, len, live })?;
        slot.copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    /// All live bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.curr]
    }

    /// Releases the last `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Underflow`] if fewer than `size` bytes are live.
    pub fn pop(&mut self, size: usize) -> CoreResult<()> {
        if size > self.curr {
            return Err(CoreError::Underflow {
                requested: size,
                live: self.curr,
            });
        }
        self.curr -= size;
        Ok(())
    }

    /// Resets the arena to empty.
    ///
    /// This is a **zero-cost** operation - capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.curr = 0;
    }

    fn grow(&mut self, required: usize) {
        let doubled = if self.data.len() < MIN_GROWTH {
            MIN_GROWTH
        } else {
            self.data.len() * 2
        };
        let new_capacity = doubled.max(required);
        tracing::trace!(
            from = self.data.len(),
            to = new_capacity,
            "arena grow"
        );
        self.data.resize(new_capacity, 0);
    }
}
