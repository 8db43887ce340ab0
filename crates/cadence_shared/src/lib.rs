//! # Cadence Shared
//!
//! The contract between the control thread (which encodes scene mutations)
//! and the graphics thread (which applies them).
//!
//! - [`SgId`] - process-unique component handle, `0` is NULL
//! - [`CommandKind`] / [`SceneCommand`] - control→graphics records
//! - [`ReadbackKind`] / [`ReadbackEvent`] - graphics→control records
//!
//! Payload layouts are an internal agreement between the two halves of one
//! process. They are not a stable wire format.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod error;
pub mod id;
pub mod protocol;
pub mod readback;

pub use constants::{MAX_NAME_LEN, MAX_UNIFORM_SLOTS, MAX_VERTEX_ATTRIBUTES};
pub use error::{ProtocolError, ProtocolResult};
pub use id::{IdAllocator, SgId};
pub use protocol::{CommandKind, SceneCommand};
pub use readback::{ReadbackEvent, ReadbackKind};
