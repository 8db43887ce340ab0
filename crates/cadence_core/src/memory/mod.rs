//! # Memory Management
//!
//! One primitive: a growable byte arena. Queues and instance buffers are
//! built on it.
//!
//! Memory is retained across `clear()`, so a steady-state frame performs no
//! allocations once the arena has grown to its working size.

mod arena;

pub use arena::Arena;
