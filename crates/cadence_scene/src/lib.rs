//! # Cadence Scene
//!
//! The component table the graphics thread owns.
//!
//! ```text
//!            SgId ──► HashMap ──► Slot { kind, index }
//!                                        │
//!   ┌────────────┬────────────┬──────────┴─┬────────────┬────────────┐
//!   │ transforms │ geometries │ materials  │ shaders    │ textures   │
//!   │ (+ meshes) │            │            │            │            │
//!   └────────────┴────────────┴────────────┴────────────┴────────────┘
//!        dense Vec per kind, swap-remove on destroy
//! ```
//!
//! ## Frame Order
//!
//! 1. [`apply::drain_commands`] - decode and apply every queued command
//! 2. [`ComponentManager::rebuild_all_matrices`] - visit only stale subtrees
//! 3. [`ComponentManager::rebuild_stale_geometries`] - refresh instance buffers
//!
//! After that the renderer reads, never writes.
//!
//! ## Handles
//!
//! Everything outside this crate holds [`SgId`]s. Table indices move on
//! every destroy, so references returned by accessors must not outlive the
//! next mutation (the borrow checker enforces this).

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod apply;
pub mod component;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod table;
pub mod transform;

pub use apply::{apply_command, drain_commands, ApplyReport};
pub use component::{ComponentKind, ComponentRef, Material, Shader, Texture};
pub use error::{SceneError, SceneResult};
pub use geometry::{Geometry, InstanceBatch, VertexAttribute};
pub use manager::{ComponentManager, Slot};
pub use table::{DenseTable, TableRecord};
pub use transform::{MeshBinding, RebuildStats, Staleness, Transform};

pub use cadence_shared::SgId;
