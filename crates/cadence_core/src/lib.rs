//! # Cadence Core
//!
//! The bottom layer of the scene core. Everything here is scene-agnostic:
//! bytes go in, bytes come out.
//!
//! ## Layout
//!
//! ```text
//! memory::Arena          growable byte buffer, addressed by offset
//! sync::Spinlock         busy-wait lock for pointer-swap sized sections
//! sync::command_queue    double-buffered queue of variable-length records
//! ```
//!
//! ## Rules
//!
//! 1. **Offsets, not pointers** - an arena may reallocate on any push, so
//!    nothing outside a single borrow holds a reference into it
//! 2. **Producers never wait on the consumer** - the only shared lock is
//!    taken per push and per swap
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence_core::command_queue;
//!
//! let (writer, mut reader) = command_queue(1024 * 1024);
//! writer.push_command(7, &[1, 2, 3]);
//!
//! reader.swap()?;
//! for record in reader.records() {
//!     println!("{} {:?}", record.kind, record.payload);
//! }
//! reader.clear();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod sync;

pub use error::{CoreError, CoreResult};
pub use memory::Arena;
pub use sync::{
    command_queue, CommandReader, CommandRecord, CommandWriter, RawSpinlock, RecordHeader,
    Records, Spinlock, SpinlockGuard, MEGABYTE,
};
