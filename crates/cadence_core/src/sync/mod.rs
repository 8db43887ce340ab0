//! # Cross-Thread Plumbing
//!
//! ```text
//! Control thread                         Graphics thread
//!   CommandWriter ──push──► [write arena]
//!                               │ swap (spinlock, once per frame)
//!                               ▼
//!                           [read arena] ──records──► CommandReader
//! ```
//!
//! One queue per direction. The graphics→control instance carries readback
//! results with the same protocol.

mod command_queue;
mod spinlock;

pub use command_queue::{
    command_queue, CommandReader, CommandRecord, CommandWriter, RecordHeader, Records, MEGABYTE,
};
pub use spinlock::{RawSpinlock, Spinlock, SpinlockGuard};
